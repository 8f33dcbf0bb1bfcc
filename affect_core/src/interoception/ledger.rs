//! Affect ledger - per-relationship bonds that decay with a 7-day half-life.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use digital_body::Emotion;

use crate::error::{AffectError, Result};

/// Hours in one bond half-life.
const HALF_LIFE_HOURS: f64 = 24.0 * 7.0;

/// The four decaying dimensions of one relationship.
///
/// Field names on disk keep the original ledger contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bond {
    #[serde(rename = "confianca")]
    pub trust: f32,
    #[serde(rename = "gratidao")]
    pub gratitude: f32,
    #[serde(rename = "saudade")]
    pub longing: f32,
    #[serde(rename = "ansiedade")]
    pub anxiety: f32,
    #[serde(rename = "_last")]
    pub last_update: DateTime<Utc>,
}

impl Bond {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            trust: 0.0,
            gratitude: 0.0,
            longing: 0.0,
            anxiety: 0.0,
            last_update: now,
        }
    }

    /// Exponential decay toward zero since the last update.
    fn decay(&mut self, now: DateTime<Utc>) {
        let hours = (now - self.last_update).num_seconds().max(0) as f64 / 3600.0;
        let factor = 0.5_f64.powf(hours / HALF_LIFE_HOURS) as f32;
        self.trust *= factor;
        self.gratitude *= factor;
        self.longing *= factor;
        self.anxiety *= factor;
        self.last_update = now;
    }

    fn clamp(&mut self) {
        self.trust = self.trust.clamp(0.0, 1.0);
        self.gratitude = self.gratitude.clamp(0.0, 1.0);
        self.longing = self.longing.clamp(0.0, 1.0);
        self.anxiety = self.anxiety.clamp(0.0, 1.0);
    }
}

/// All bonds, keyed by the counterpart's name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffectLedger {
    bonds: HashMap<String, Bond>,
}

impl AffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bond(&self, name: &str) -> Option<&Bond> {
        self.bonds.get(name)
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Decay every entry independently to `now`.
    pub fn decay_entries(&mut self, now: DateTime<Utc>) {
        for bond in self.bonds.values_mut() {
            bond.decay(now);
        }
    }

    /// Record an emotion felt toward `name` with perceptual gain `gain` in
    /// [0, 1]. Every entry is decayed first, then the emotion-dependent
    /// increments land on the named bond, clamped to [0, 1].
    pub fn record(&mut self, name: &str, emotion: Emotion, gain: f32, now: DateTime<Utc>) {
        self.decay_entries(now);

        let gain = gain.clamp(0.0, 1.0);
        let bond = self
            .bonds
            .entry(name.to_string())
            .or_insert_with(|| Bond::new(now));

        match emotion {
            Emotion::Joy | Emotion::Serenity | Emotion::Love => {
                bond.trust += 0.7 * gain;
                bond.gratitude += 0.5 * gain;
            }
            Emotion::Fear => {
                bond.anxiety += 0.6 * gain;
                bond.trust -= 0.3 * gain;
            }
            Emotion::Sadness | Emotion::Longing => {
                bond.longing += 0.5 * gain;
            }
            Emotion::Anger | Emotion::Frustration => {
                bond.anxiety += 0.4 * gain;
                bond.trust -= 0.4 * gain;
            }
            Emotion::Curiosity | Emotion::Neutral => {}
        }

        bond.clamp();
        bond.last_update = now;
    }
}

/// Handle to the ledger's JSON file. Read-modify-write, no locking.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger, starting empty when the file is missing or corrupt.
    pub fn load(&self) -> AffectLedger {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "corrupt affect ledger, starting empty");
                AffectLedger::new()
            }),
            Err(_) => AffectLedger::new(),
        }
    }

    pub fn save(&self, ledger: &AffectLedger) -> Result<()> {
        let text = serde_json::to_string_pretty(ledger).map_err(|e| AffectError::json(&self.path, e))?;
        std::fs::write(&self.path, text).map_err(|e| AffectError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_half_life_halves_each_dimension() {
        let now = Utc::now();
        let mut ledger = AffectLedger::new();
        ledger.record("Vinicius", Emotion::Joy, 1.0, now - Duration::days(7));

        let before = ledger.bond("Vinicius").unwrap().clone();
        ledger.decay_entries(now);
        let after = ledger.bond("Vinicius").unwrap();

        assert!((after.trust - before.trust * 0.5).abs() < 1e-4);
        assert!((after.gratitude - before.gratitude * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_entries_decay_independently(){
        let now = Utc::now();
        let mut ledger = AffectLedger::new();
        ledger.record("Old", Emotion::Joy, 1.0, now - Duration::days(7));
        ledger.record("New", Emotion::Joy, 1.0, now);

        // recording "New" already decayed "Old" to `now`; the fresh entry
        // must be untouched
        let old = ledger.bond("Old").unwrap();
        let new = ledger.bond("New").unwrap();
        assert!((old.trust - 0.35).abs() < 1e-4);
        assert!((new.trust - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_gains_by_emotion() {
        let now = Utc::now();
        let mut ledger = AffectLedger::new();

        ledger.record("A", Emotion::Fear, 0.5, now);
        let a = ledger.bond("A").unwrap();
        assert!((a.anxiety - 0.3).abs() < 1e-6);
        assert_eq!(a.trust, 0.0); // negative gain clamps at zero

        ledger.record("B", Emotion::Sadness, 1.0, now);
        assert!((ledger.bond("B").unwrap().longing - 0.5).abs() < 1e-6);

        ledger.record("C", Emotion::Curiosity, 1.0, now);
        let c = ledger.bond("C").unwrap();
        assert_eq!(c.trust, 0.0);
        assert_eq!(c.anxiety, 0.0);
    }

    #[test]
    fn test_dimensions_clamped_to_unit() {
        let now = Utc::now();
        let mut ledger = AffectLedger::new();
        for _ in 0..5 {
            ledger.record("A", Emotion::Love, 1.0, now);
        }
        let a = ledger.bond("A").unwrap();
        assert_eq!(a.trust, 1.0);
        assert_eq!(a.gratitude, 1.0);
    }

    #[test]
    fn test_disk_contract_field_names() {
        let now = Utc::now();
        let mut ledger = AffectLedger::new();
        ledger.record("Vinicius", Emotion::Joy, 1.0, now);

        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains("\"confianca\""));
        assert!(json.contains("\"gratidao\""));
        assert!(json.contains("\"saudade\""));
        assert!(json.contains("\"ansiedade\""));
        assert!(json.contains("\"_last\""));

        let back: AffectLedger = serde_json::from_str(&json).unwrap();
        assert!((back.bond("Vinicius").unwrap().trust - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_store_roundtrip_and_missing_file() {
        let path = std::env::temp_dir().join(format!("ledger-{}.json", uuid::Uuid::new_v4()));
        let store = LedgerStore::new(&path);

        assert!(store.load().is_empty());

        let mut ledger = AffectLedger::new();
        ledger.record("A", Emotion::Joy, 0.8, Utc::now());
        store.save(&ledger).unwrap();

        let back = store.load();
        assert_eq!(back.len(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
