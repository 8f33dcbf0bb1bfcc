//! Cognitive friction - a passive, opaque load/damage accumulator.
//!
//! Friction introduces irreversible costs and functional degradation without
//! ever telling the agent about it. Load is the recoverable pool; once it
//! crosses the conversion threshold, a fraction of the excess becomes
//! permanent damage and is removed from the pool. Damage only decreases
//! through the explicit operator reset in [`reset`].

mod reset;

pub use reset::{reset_damage, ResetOutcome};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{AffectError, Result};

/// Load level above which the excess converts into permanent damage.
const CONVERSION_THRESHOLD: f32 = 0.6;

/// Damage level above which the chronic flag latches.
const CHRONIC_THRESHOLD: f32 = 0.35;

/// Capacity of the recent instant-cost window.
const RECENT_WINDOW: usize = 32;

/// Tunable friction parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionConfig {
    /// Minimum friction always present.
    pub base_friction: f32,
    /// How much intense stress/emotion amplifies friction.
    pub stress_gain: f32,
    /// Slow recovery per step (never complete).
    pub recovery_rate: f32,
    /// Fraction of over-threshold load that becomes permanent damage.
    pub irreversibility: f32,
    /// Functional noise applied to memory recall.
    pub memory_noise: f32,
    /// Functional noise applied to planning scores.
    pub planning_noise: f32,
    /// Functional noise applied to generation temperature.
    pub language_noise: f32,
}

impl Default for FrictionConfig {
    fn default() -> Self {
        Self {
            base_friction: 0.02,
            stress_gain: 0.6,
            recovery_rate: 0.001,
            irreversibility: 0.15,
            memory_noise: 0.03,
            planning_noise: 0.04,
            language_noise: 0.05,
        }
    }
}

/// One audit entry appended by the operator reset utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetEntry {
    pub timestamp: DateTime<Utc>,
    pub old_damage: f32,
    pub new_damage: f32,
    pub reason: String,
}

/// The durable friction record. One JSON document on disk; read-modify-write
/// with no locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrictionRecord {
    pub damage: f32,
    pub load: f32,
    pub chronic: bool,
    pub total_sessions: u64,
    pub last_updated: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub reset_history: Vec<ResetEntry>,
}

impl Default for FrictionRecord {
    fn default() -> Self {
        Self {
            damage: 0.0,
            load: 0.0,
            chronic: false,
            total_sessions: 0,
            last_updated: Utc::now(),
            version: "1.0.0".to_string(),
            reset_history: Vec::new(),
        }
    }
}

/// Handle to the friction record's file.
#[derive(Debug, Clone)]
pub struct FrictionStore {
    path: PathBuf,
}

impl FrictionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record, starting from the documented neutral default when the
    /// file is missing or corrupt.
    pub fn load(&self) -> FrictionRecord {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "corrupt friction record, starting fresh");
                FrictionRecord::default()
            }),
            Err(_) => FrictionRecord::default(),
        }
    }

    /// Write the record.
    pub fn save(&self, record: &FrictionRecord) -> Result<()> {
        let text = serde_json::to_string_pretty(record).map_err(|e| AffectError::json(&self.path, e))?;
        std::fs::write(&self.path, text).map_err(|e| AffectError::io(&self.path, e))
    }

    /// Load the record and count this process start as a new session.
    pub fn open_session(&self) -> FrictionRecord {
        let mut record = self.load();
        record.total_sessions += 1;
        record.last_updated = Utc::now();
        if let Err(e) = self.save(&record) {
            warn!(error = %e, "failed to persist session counter");
        }
        record
    }

    /// Read-modify-write of the volatile fields, preserving session counter
    /// and reset history already on disk.
    fn save_state(&self, load: f32, damage: f32, chronic: bool) -> Result<()> {
        let mut record = self.load();
        record.load = load;
        record.damage = damage;
        record.chronic = chronic;
        record.last_updated = Utc::now();
        self.save(&record)
    }
}

/// Read-only observability surface for the human operator.
///
/// These values must never reach the agent's own generation context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrictionMetrics {
    pub load: f32,
    pub damage: f32,
    pub recent_mean: f32,
}

/// The monotone-ratchet friction model.
pub struct CognitiveFriction {
    config: FrictionConfig,
    rng: StdRng,
    store: Option<FrictionStore>,

    load: f32,
    damage: f32,
    chronic: bool,
    total_sessions: u64,

    recent: VecDeque<f32>,
}

impl CognitiveFriction {
    /// In-memory friction with no persistence. `seed` makes the stochastic
    /// jitter deterministic for tests.
    pub fn new(config: FrictionConfig, seed: Option<u64>) -> Self {
        Self {
            config,
            rng: match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            },
            store: None,
            load: 0.0,
            damage: 0.0,
            chronic: false,
            total_sessions: 0,
            recent: VecDeque::with_capacity(RECENT_WINDOW),
        }
    }

    /// Persistent friction bound to a record file. Construction counts as a
    /// session: the on-disk session counter is incremented as a side effect.
    pub fn with_store(config: FrictionConfig, store: FrictionStore, seed: Option<u64>) -> Self {
        let record = store.open_session();
        let mut friction = Self::new(config, seed);
        friction.load = record.load;
        friction.damage = record.damage;
        friction.chronic = record.chronic;
        friction.total_sessions = record.total_sessions;
        friction.store = Some(store);
        friction
    }

    /// Advance the friction model one cycle.
    ///
    /// Does not return any explicit degradation signal; the effects surface
    /// only through the `perturb_*` functions.
    pub fn step(&mut self, emotional_intensity: f32, arousal: f32, task_complexity: f32) {
        let stress = emotional_intensity.max(arousal);
        let mut instant = self.config.base_friction + self.config.stress_gain * stress * task_complexity;

        // soft stochastic jitter
        instant *= self.rng.gen_range(0.9..=1.1);

        if self.damage > CHRONIC_THRESHOLD {
            self.chronic = true;
        }

        self.load += instant;
        if self.recent.len() == RECENT_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(instant);

        // irreversible conversion: the load that becomes damage is
        // permanently removed from the recoverable pool
        if self.load > CONVERSION_THRESHOLD {
            let excess = self.load - CONVERSION_THRESHOLD;
            self.damage = (self.damage + excess * self.config.irreversibility).min(1.0);
            self.load *= 1.0 - self.config.irreversibility;
        }

        // slow, never-complete recovery
        self.load = (self.load - self.config.recovery_rate).max(0.0);

        self.persist();
    }

    /// Extra load relief (e.g. during rest cycles). Load never goes negative.
    pub fn relieve(&mut self, amount: f32) {
        self.load = (self.load - amount.max(0.0)).max(0.0);
        self.persist();
    }

    /// Extra load added outside a step (e.g. internal-conflict resistance).
    pub fn strain(&mut self, amount: f32) {
        self.load += amount.max(0.0);
        self.persist();
    }

    /// Apply subtle Gaussian noise to a recalled memory vector. Empty input
    /// is returned unchanged.
    pub fn perturb_memory(&mut self, vector: &[f32]) -> Vec<f32> {
        if vector.is_empty() {
            return Vec::new();
        }
        let sigma = self.config.memory_noise * (0.3 + self.damage);
        vector.iter().map(|v| v + gauss(&mut self.rng, sigma)).collect()
    }

    /// Degrade a recalled list in place. Under damage an item may be lost
    /// outright and the remembered order may shuffle; below the damage floor
    /// recall is untouched.
    pub fn perturb_recall<T>(&mut self, items: &mut Vec<T>) {
        if self.damage <= 0.04 || items.is_empty() {
            return;
        }
        if items.len() > 1 && self.rng.gen::<f32>() < (0.12 + self.damage).min(0.35) {
            let idx = self.rng.gen_range(0..items.len());
            items.remove(idx);
        }
        if self.rng.gen::<f32>() < (0.06 + self.damage / 2.0).min(0.15) {
            items.shuffle(&mut self.rng);
        }
    }

    /// Slightly reduce a planning/evaluation score, floored at 0.
    pub fn perturb_planning(&mut self, score: f32) -> f32 {
        let n = self.config.planning_noise * (0.2 + self.damage);
        (score * (1.0 - n)).max(0.0)
    }

    /// Raise the effective generation temperature, capped at 2.0.
    pub fn perturb_language(&mut self, temperature: f32) -> f32 {
        let n = self.config.language_noise * (0.2 + self.damage);
        (temperature * (1.0 + n)).min(2.0)
    }

    /// Operator-only metrics. Never expose these to the agent.
    pub fn external_metrics(&self) -> FrictionMetrics {
        let recent_mean = if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().sum::<f32>() / self.recent.len() as f32
        };
        FrictionMetrics {
            load: round4(self.load),
            damage: round4(self.damage),
            recent_mean: round4(recent_mean),
        }
    }

    pub fn load(&self) -> f32 {
        self.load
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn is_chronic(&self) -> bool {
        self.chronic
    }

    pub fn total_sessions(&self) -> u64 {
        self.total_sessions
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_state(self.load, self.damage, self.chronic) {
                warn!(error = %e, "failed to persist friction state");
            }
        }
    }
}

/// Box-Muller sample from N(0, sigma).
fn gauss(rng: &mut StdRng, sigma: f32) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos() * sigma
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
