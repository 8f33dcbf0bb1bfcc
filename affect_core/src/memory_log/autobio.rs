//! Autobiographical consolidation - the slow distillation of the raw
//! exchange log into a compact first-person life record.
//!
//! Runs during rest. Scans a recent window of the memory log, keeps only the
//! emotionally marked exchanges, and appends a short summary of each to a
//! separate JSONL file. Damage leaves its mark here: above a threshold the
//! summaries collapse into a neutral fragment, as if the event were
//! remembered but no longer felt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use digital_body::Emotion;

use crate::error::{AffectError, Result};
use crate::memory_log::{MemoryEntry, MemoryLog};

/// Emotions strong enough to mark an exchange as autobiographical on their
/// own, at any intensity.
const STRONG_EMOTIONS: &[Emotion] = &[
    Emotion::Sadness,
    Emotion::Joy,
    Emotion::Fear,
    Emotion::Love,
    Emotion::Anger,
];

/// How many raw entries one consolidation pass scans.
const SCAN_WINDOW: usize = 200;

/// At most this many new records per pass.
const MAX_PER_PASS: usize = 8;

/// The autobiography file is truncated to its newest lines at this count.
const MAX_LINES: usize = 300;

/// Emotion intensity at or above which an exchange is significant.
const INTENSITY_FLOOR: f32 = 0.45;

/// Reflection length at or above which an exchange is significant.
const MIN_REFLECTION_LEN: usize = 40;

/// Damage above this collapses summaries into a neutral fragment.
const FRAGMENTATION_DAMAGE: f32 = 0.15;

/// Substitute summary written when damage has fragmented recall.
pub const FRAGMENT_SUMMARY: &str = "A fragmented record of an emotional event.";

/// One consolidated autobiographical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutobioEntry {
    pub consolidated_at: DateTime<Utc>,
    /// Timestamp of the exchange this record distills.
    pub origin_ts: DateTime<Utc>,
    pub author: String,
    pub emotion: Emotion,
    /// Opening of the original input, for dedup and recall.
    pub excerpt: String,
    pub summary: String,
}

impl AutobioEntry {
    fn dedup_key(&self) -> (String, String, String) {
        (
            self.origin_ts.to_rfc3339(),
            self.author.clone(),
            head(&self.excerpt, 60),
        )
    }
}

/// Handle to the autobiography JSONL file.
#[derive(Debug, Clone)]
pub struct Autobiography {
    path: PathBuf,
}

impl Autobiography {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All consolidated records, oldest first. Missing file is an empty
    /// autobiography; corrupt lines are skipped with a warning.
    pub fn entries(&self) -> Vec<AutobioEntry> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(_) => return Vec::new(),
        };
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines().map_while(|l| l.ok()) {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AutobioEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "skipping corrupt autobiography line");
                }
            }
        }
        entries
    }

    /// Consolidate one pass over the raw memory log.
    ///
    /// Scans the last [`SCAN_WINDOW`] entries, keeps the significant ones not
    /// yet consolidated, and appends up to [`MAX_PER_PASS`] of the newest as
    /// summaries. Returns how many records were written. When `damage`
    /// exceeds the fragmentation threshold the summaries lose their content
    /// and only a neutral fragment is kept.
    pub fn consolidate(&self, memory: &MemoryLog, damage: f32, now: DateTime<Utc>) -> Result<usize> {
        let raw = memory.load_recent(SCAN_WINDOW);
        let mut seen: HashSet<(String, String, String)> =
            self.entries().iter().map(AutobioEntry::dedup_key).collect();

        let mut fresh = Vec::new();
        for entry in &raw {
            if !is_significant(entry) {
                continue;
            }
            let record = summarize(entry, damage, now);
            let key = record.dedup_key();
            if seen.contains(&key) {
                continue;
            }
            seen.insert(key);
            fresh.push(record);
        }

        // newest events first into the autobiography
        let skip = fresh.len().saturating_sub(MAX_PER_PASS);
        let fresh = fresh.split_off(skip);

        if fresh.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AffectError::io(&self.path, e))?;
        for record in &fresh {
            let line =
                serde_json::to_string(record).map_err(|e| AffectError::json(&self.path, e))?;
            writeln!(file, "{line}").map_err(|e| AffectError::io(&self.path, e))?;
        }
        drop(file);

        self.enforce_cap()?;
        Ok(fresh.len())
    }

    /// Keep only the newest [`MAX_LINES`] lines of the file.
    fn enforce_cap(&self) -> Result<()> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return Ok(()),
        };
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() <= MAX_LINES {
            return Ok(());
        }
        let tail = &lines[lines.len() - MAX_LINES..];
        let mut out = tail.join("\n");
        out.push('\n');
        std::fs::write(&self.path, out).map_err(|e| AffectError::io(&self.path, e))
    }
}

/// An exchange is worth consolidating when it carried real content and was
/// emotionally marked: high intensity, a strong emotion, or a substantial
/// reflection.
fn is_significant(entry: &MemoryEntry) -> bool {
    let has_content = !entry.author.content.trim().is_empty()
        || !entry.response.trim().is_empty()
        || entry.reflection.is_some();
    if !has_content {
        return false;
    }

    let (emotion, intensity) = match &entry.internal_state {
        Some(snapshot) => (snapshot.emotion, snapshot.emotion_intensity),
        None => (Emotion::Neutral, 0.0),
    };

    intensity >= INTENSITY_FLOOR
        || STRONG_EMOTIONS.contains(&emotion)
        || entry
            .reflection
            .as_deref()
            .is_some_and(|r| r.trim().len() >= MIN_REFLECTION_LEN)
}

fn summarize(entry: &MemoryEntry, damage: f32, now: DateTime<Utc>) -> AutobioEntry {
    let emotion = entry
        .internal_state
        .as_ref()
        .map(|s| s.emotion)
        .unwrap_or_default();
    let excerpt = head(entry.author.content.trim(), 120);

    let summary = if damage > FRAGMENTATION_DAMAGE {
        FRAGMENT_SUMMARY.to_string()
    } else if excerpt.is_empty() {
        let voice = head(entry.response.trim(), 120);
        format!(
            "On {}, I felt {emotion} while speaking alone: '{voice}'",
            entry.ts.format("%Y-%m-%d")
        )
    } else {
        format!(
            "On {}, I felt {emotion} when {} said: '{excerpt}'",
            entry.ts.format("%Y-%m-%d"),
            entry.author.name
        )
    };

    AutobioEntry {
        consolidated_at: now,
        origin_ts: entry.ts,
        author: entry.author.name.clone(),
        emotion,
        excerpt,
        summary,
    }
}

/// First `n` characters, safe on any UTF-8 boundary.
fn head(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_log::AuthorPayload;
    use digital_body::PhysiologicalState;
    use uuid::Uuid;

    fn temp_pair() -> (MemoryLog, Autobiography) {
        let id = Uuid::new_v4();
        let log = MemoryLog::new(std::env::temp_dir().join(format!("memory-{id}.jsonl")));
        let bio = Autobiography::new(std::env::temp_dir().join(format!("autobio-{id}.jsonl")));
        (log, bio)
    }

    fn cleanup(log: &MemoryLog, bio: &Autobiography) {
        let _ = std::fs::remove_file(log.path());
        let _ = std::fs::remove_file(bio.path());
    }

    fn snapshot_with(emotion: Emotion, intensity: f32) -> digital_body::StateSnapshot {
        let mut body = PhysiologicalState::new();
        body.current_emotion = emotion;
        body.emotion_intensity = intensity;
        body.snapshot()
    }

    #[test]
    fn test_only_marked_exchanges_consolidate() {
        let (log, bio) = temp_pair();

        log.append(
            AuthorPayload::dialogue("A", "the weather"),
            "mild",
            None,
            Some(snapshot_with(Emotion::Neutral, 0.1)),
        )
        .unwrap();
        log.append(
            AuthorPayload::dialogue("A", "I lost someone dear"),
            "I am here with you",
            None,
            Some(snapshot_with(Emotion::Sadness, 0.2)),
        )
        .unwrap();
        log.append(
            AuthorPayload::dialogue("A", "an ordinary note"),
            "ok",
            Some("this exchange left a long trace in me, hard to place"),
            Some(snapshot_with(Emotion::Neutral, 0.1)),
        )
        .unwrap();

        let written = bio.consolidate(&log, 0.0, Utc::now()).unwrap();
        // strong emotion and long reflection qualify; the neutral small talk does not
        assert_eq!(written, 2);

        let entries = bio.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].emotion, Emotion::Sadness);
        assert!(entries[0].summary.contains("sadness"));
        assert!(entries[0].summary.contains("I lost someone dear"));

        cleanup(&log, &bio);
    }

    #[test]
    fn test_high_intensity_alone_qualifies() {
        let (log, bio) = temp_pair();
        log.append(
            AuthorPayload::dialogue("A", "a discovery"),
            "fascinating",
            None,
            Some(snapshot_with(Emotion::Curiosity, 0.6)),
        )
        .unwrap();

        assert_eq!(bio.consolidate(&log, 0.0, Utc::now()).unwrap(), 1);
        cleanup(&log, &bio);
    }

    #[test]
    fn test_second_pass_dedupes() {
        let (log, bio) = temp_pair();
        log.append(
            AuthorPayload::dialogue("A", "I feel a great joy"),
            "so do I",
            None,
            Some(snapshot_with(Emotion::Joy, 0.8)),
        )
        .unwrap();

        assert_eq!(bio.consolidate(&log, 0.0, Utc::now()).unwrap(), 1);
        assert_eq!(bio.consolidate(&log, 0.0, Utc::now()).unwrap(), 0);
        assert_eq!(bio.entries().len(), 1);

        cleanup(&log, &bio);
    }

    #[test]
    fn test_per_pass_limit_keeps_newest() {
        let (log, bio) = temp_pair();
        for i in 0..12 {
            log.append(
                AuthorPayload::dialogue("A", &format!("strong moment {i}")),
                "felt",
                None,
                Some(snapshot_with(Emotion::Fear, 0.9)),
            )
            .unwrap();
        }

        assert_eq!(bio.consolidate(&log, 0.0, Utc::now()).unwrap(), 8);
        let first = bio.entries();
        assert!(first[0].excerpt.contains("moment 4"));

        // a later pass picks up the older remainder
        assert_eq!(bio.consolidate(&log, 0.0, Utc::now()).unwrap(), 4);
        assert_eq!(bio.entries().len(), 12);

        cleanup(&log, &bio);
    }

    #[test]
    fn test_damage_collapses_summary_to_fragment() {
        let (log, bio) = temp_pair();
        log.append(
            AuthorPayload::dialogue("A", "something that shook me"),
            "shaken",
            None,
            Some(snapshot_with(Emotion::Fear, 0.9)),
        )
        .unwrap();

        bio.consolidate(&log, 0.3, Utc::now()).unwrap();
        let entries = bio.entries();
        assert_eq!(entries[0].summary, FRAGMENT_SUMMARY);
        // origin metadata survives even when content does not
        assert_eq!(entries[0].emotion, Emotion::Fear);

        cleanup(&log, &bio);
    }

    #[test]
    fn test_cap_keeps_newest_lines() {
        let (log, bio) = temp_pair();
        let now = Utc::now();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(bio.path())
            .unwrap();
        for i in 0..310 {
            let entry = AutobioEntry {
                consolidated_at: now,
                origin_ts: now,
                author: "A".to_string(),
                emotion: Emotion::Joy,
                excerpt: format!("m{i}"),
                summary: format!("s{i}"),
            };
            writeln!(file, "{}", serde_json::to_string(&entry).unwrap()).unwrap();
        }
        drop(file);

        bio.enforce_cap().unwrap();
        let entries = bio.entries();
        assert_eq!(entries.len(), 300);
        assert_eq!(entries[0].excerpt, "m10");
        assert_eq!(entries[299].excerpt, "m309");

        cleanup(&log, &bio);
    }

    #[test]
    fn test_empty_exchange_never_consolidates() {
        let (log, bio) = temp_pair();
        log.append(
            AuthorPayload::dialogue("A", "   "),
            "",
            None,
            Some(snapshot_with(Emotion::Joy, 0.9)),
        )
        .unwrap();

        assert_eq!(bio.consolidate(&log, 0.0, Utc::now()).unwrap(), 0);
        cleanup(&log, &bio);
    }
}
