//! Agent configuration - tuning knobs and data-file locations, loadable
//! from TOML with documented defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AffectError;
use crate::friction::FrictionConfig;

/// Top-level configuration for a running agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Friction tuning.
    pub friction: FrictionConfig,

    /// Data-file locations.
    pub paths: DataPaths,

    /// Sleep interval per cycle, seconds.
    pub intervals: CycleIntervals,
}

/// Where the persisted records live. All paths are independent files with
/// read-modify-write access and no locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub friction_record: PathBuf,
    pub affect_ledger: PathBuf,
    pub memory_log: PathBuf,
    pub autobiography: PathBuf,
    pub discontinuity: PathBuf,
    pub operator_metrics: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            friction_record: PathBuf::from("friction_damage.json"),
            affect_ledger: PathBuf::from("affections.json"),
            memory_log: PathBuf::from("agent_memory.jsonl"),
            autobiography: PathBuf::from("autobiography.jsonl"),
            discontinuity: PathBuf::from("discontinuity.json"),
            operator_metrics: PathBuf::from("friction_metrics.log"),
        }
    }
}

/// Seconds between autonomous turns, per operating cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleIntervals {
    pub vigil: u64,
    pub introspection: u64,
    pub rest: u64,
}

impl Default for CycleIntervals {
    fn default() -> Self {
        Self {
            vigil: 25,
            introspection: 60,
            rest: 600,
        }
    }
}

impl AgentConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self, AffectError> {
        toml::from_str(text).map_err(|e| AffectError::Config(e.to_string()))
    }

    /// Load a configuration file, falling back to defaults when the file is
    /// missing. A present-but-malformed file is an error: silently ignoring
    /// operator tuning would be worse than refusing to start.
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, AffectError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AffectError::io(path, e)),
        }
    }
}
