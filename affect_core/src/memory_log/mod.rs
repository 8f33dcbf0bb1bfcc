//! Append-only JSONL memory of exchanges.
//!
//! Each line is one exchange: who spoke, what was answered, optionally an
//! emotional reflection and a body snapshot. Reflections that read as
//! ontological self-narration are dropped before they reach disk, so the
//! log can be re-read as reflection history without re-filtering.

pub mod autobio;

pub use autobio::{AutobioEntry, Autobiography, FRAGMENT_SUMMARY};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use digital_body::StateSnapshot;

use crate::error::{AffectError, Result};
use crate::narrative::contains_ontological_phrase;

/// Who produced the input of an exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorPayload {
    pub name: String,
    pub content: String,
    /// Kind of exchange, e.g. "dialogue" or "autonomous".
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

impl AuthorPayload {
    pub fn dialogue(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_string(),
            kind: "dialogue".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn autonomous(content: &str) -> Self {
        Self {
            name: "system".to_string(),
            content: content.to_string(),
            kind: "autonomous".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// One line of the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub author: AuthorPayload,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_state: Option<StateSnapshot>,
}

/// Handle to the JSONL file. Append-only; reads tolerate corrupt lines.
#[derive(Debug, Clone)]
pub struct MemoryLog {
    path: PathBuf,
}

impl MemoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one exchange. A reflection carrying an ontological phrase is
    /// dropped before writing; everything else in the entry still lands.
    pub fn append(
        &self,
        author: AuthorPayload,
        response: &str,
        reflection: Option<&str>,
        internal_state: Option<StateSnapshot>,
    ) -> Result<MemoryEntry> {
        let reflection = reflection.and_then(|r| {
            if contains_ontological_phrase(r) {
                debug!("dropping ontological reflection before persisting");
                None
            } else {
                Some(r.to_string())
            }
        });

        let entry = MemoryEntry {
            id: Uuid::new_v4(),
            ts: Utc::now(),
            author,
            response: response.to_string(),
            reflection,
            internal_state,
        };

        let line =
            serde_json::to_string(&entry).map_err(|e| AffectError::json(&self.path, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AffectError::io(&self.path, e))?;
        writeln!(file, "{line}").map_err(|e| AffectError::io(&self.path, e))?;
        Ok(entry)
    }

    /// The last `n` entries, oldest first. A missing file is an empty
    /// history; corrupt lines are skipped with a warning.
    pub fn load_recent(&self, n: usize) -> Vec<MemoryEntry> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(_) => return Vec::new(),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "unreadable memory line, stopping");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MemoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "skipping corrupt memory line");
                }
            }
        }

        let skip = entries.len().saturating_sub(n);
        entries.split_off(skip)
    }

    /// Responses of the last `n` entries, oldest first.
    pub fn recent_responses(&self, n: usize) -> Vec<String> {
        self.load_recent(n)
            .into_iter()
            .map(|entry| entry.response)
            .collect()
    }

    /// Reflections among the last `n` entries, oldest first. Entries without
    /// a reflection contribute nothing.
    pub fn recent_reflections(&self, n: usize) -> Vec<String> {
        self.load_recent(n)
            .into_iter()
            .filter_map(|entry| entry.reflection)
            .collect()
    }

    /// Name of the author of the most recent entry, if any.
    pub fn last_author(&self) -> Option<String> {
        self.load_recent(1)
            .pop()
            .map(|entry| entry.author.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log() -> MemoryLog {
        let path = std::env::temp_dir().join(format!("memory-{}.jsonl", Uuid::new_v4()));
        MemoryLog::new(path)
    }

    #[test]
    fn test_append_and_load_recent() {
        let log = temp_log();

        log.append(AuthorPayload::dialogue("Vinicius", "hello"), "hi", None, None)
            .unwrap();
        log.append(
            AuthorPayload::dialogue("Vinicius", "how are you"),
            "steady",
            Some("a calm exchange"),
            None,
        )
        .unwrap();

        let entries = log.load_recent(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].response, "hi");
        assert_eq!(entries[1].reflection.as_deref(), Some("a calm exchange"));

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn test_load_recent_keeps_tail_only() {
        let log = temp_log();
        for i in 0..5 {
            log.append(
                AuthorPayload::dialogue("A", &format!("m{i}")),
                &format!("r{i}"),
                None,
                None,
            )
            .unwrap();
        }

        let responses = log.recent_responses(2);
        assert_eq!(responses, vec!["r3".to_string(), "r4".to_string()]);

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn test_ontological_reflection_is_dropped() {
        let log = temp_log();
        let entry = log
            .append(
                AuthorPayload::dialogue("A", "who are you"),
                "an answer",
                Some("I feel my existence expanding"),
                None,
            )
            .unwrap();
        assert!(entry.reflection.is_none());

        let stored = log.load_recent(1);
        assert!(stored[0].reflection.is_none());
        assert_eq!(stored[0].response, "an answer");

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn test_recent_reflections_skip_missing() {
        let log = temp_log();
        log.append(AuthorPayload::dialogue("A", "a"), "r1", None, None)
            .unwrap();
        log.append(AuthorPayload::dialogue("A", "b"), "r2", Some("noted"), None)
            .unwrap();

        assert_eq!(log.recent_reflections(10), vec!["noted".to_string()]);

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let log = temp_log();
        log.append(AuthorPayload::dialogue("A", "a"), "good", None, None)
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file, "{{not json").unwrap();
        log.append(AuthorPayload::dialogue("B", "b"), "also good", None, None)
            .unwrap();

        let entries = log.load_recent(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(log.last_author().as_deref(), Some("B"));

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let log = temp_log();
        assert!(log.load_recent(10).is_empty());
        assert!(log.last_author().is_none());
    }
}
