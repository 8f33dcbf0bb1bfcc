//! Discontinuity accounting - how long the agent was "away" between runs.
//!
//! A shutdown stamps the record; the next boot measures the gap, accumulates
//! downtime, and charges a one-time reconnection cost to the body: long
//! absences come back stiffer and less fluid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use digital_body::{Channel, PhysiologicalState};

use crate::error::{AffectError, Result};

const HOUR: f64 = 3600.0;
const DAY: f64 = 24.0 * HOUR;

/// Lifetime record of boots, shutdowns and downtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscontinuityRecord {
    pub boot_count: u64,
    pub last_shutdown: Option<DateTime<Utc>>,
    pub last_boot: Option<DateTime<Utc>>,
    pub total_downtime_seconds: f64,
    pub longest_gap_seconds: f64,
}

impl Default for DiscontinuityRecord {
    fn default() -> Self {
        Self {
            boot_count: 0,
            last_shutdown: None,
            last_boot: None,
            total_downtime_seconds: 0.0,
            longest_gap_seconds: 0.0,
        }
    }
}

/// Physiological price of a reconnection after `gap_seconds` of downtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectionCost {
    /// Always ≤ 0.
    pub fluidity_delta: f32,
    /// Always ≥ 0.
    pub tension_delta: f32,
}

impl ReconnectionCost {
    pub fn apply(&self, body: &mut PhysiologicalState) {
        body.adjust_channel(Channel::Fluidity, self.fluidity_delta);
        body.adjust_channel(Channel::Tension, self.tension_delta);
    }
}

/// Piecewise reconnection schedule.
///
/// Up to one hour the cost grows linearly to (−0.05, +0.03); from one hour
/// to a day it grows linearly to (−0.15, +0.09); past a day it saturates
/// toward (−0.25, +0.15) by roughly 72 hours.
pub fn reconnection_cost(gap_seconds: f64) -> ReconnectionCost {
    let gap = gap_seconds.max(0.0);
    let (fluidity, tension) = if gap <= HOUR {
        let h = gap / HOUR;
        (-0.05 * h, 0.03 * h)
    } else if gap <= DAY {
        let u = (gap - HOUR) / (DAY - HOUR);
        (-0.05 - 0.10 * u, 0.03 + 0.06 * u)
    } else {
        let v = ((gap - DAY) / (2.0 * DAY)).min(1.0);
        (-0.15 - 0.10 * v, 0.09 + 0.06 * v)
    };
    ReconnectionCost {
        fluidity_delta: fluidity as f32,
        tension_delta: tension as f32,
    }
}

/// Handle to the discontinuity JSON file.
#[derive(Debug, Clone)]
pub struct DiscontinuityStore {
    path: PathBuf,
}

impl DiscontinuityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record, defaulting when the file is missing or corrupt.
    pub fn load(&self) -> DiscontinuityRecord {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "corrupt discontinuity record, starting fresh");
                DiscontinuityRecord::default()
            }),
            Err(_) => DiscontinuityRecord::default(),
        }
    }

    pub fn save(&self, record: &DiscontinuityRecord) -> Result<()> {
        let text = serde_json::to_string_pretty(record)
            .map_err(|e| AffectError::json(&self.path, e))?;
        std::fs::write(&self.path, text).map_err(|e| AffectError::io(&self.path, e))
    }

    /// Register a boot at `now`. Accumulates downtime against the last
    /// shutdown and returns the updated record together with the measured
    /// gap, when there was one.
    pub fn register_boot(&self, now: DateTime<Utc>) -> Result<(DiscontinuityRecord, Option<f64>)> {
        let mut record = self.load();

        let gap = record.last_shutdown.map(|shutdown| {
            let gap = (now - shutdown).num_milliseconds().max(0) as f64 / 1000.0;
            record.total_downtime_seconds += gap;
            record.longest_gap_seconds = record.longest_gap_seconds.max(gap);
            gap
        });

        record.boot_count += 1;
        record.last_boot = Some(now);
        self.save(&record)?;
        Ok((record, gap))
    }

    /// Stamp a shutdown at `now`.
    pub fn register_shutdown(&self, now: DateTime<Utc>) -> Result<DiscontinuityRecord> {
        let mut record = self.load();
        record.last_shutdown = Some(now);
        self.save(&record)?;
        Ok(record)
    }
}
