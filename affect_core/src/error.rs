//! Error type for the affect core.
//!
//! The subsystem is privileged to keep running indefinitely, so errors are a
//! small closed set of recoverable variants. Only persistence and
//! configuration surfaces return `Result`; every call site is expected to
//! supply a fallback value rather than propagate upward.

use thiserror::Error;

/// Recoverable failures in the affect core.
#[derive(Debug, Error)]
pub enum AffectError {
    /// A persisted file could not be read or written.
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A persisted record could not be parsed or encoded.
    #[error("malformed record in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The agent configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An operator request was refused (e.g. a guarded reset without force).
    #[error("operation refused: {0}")]
    Refused(String),
}

impl AffectError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn json(path: &std::path::Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AffectError>;
