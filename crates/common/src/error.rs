//! Common error types for the scenario analyzer.

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for analyzer operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service config not found: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("service config malformed: {} - {reason}", path.display())]
    ConfigMalformed { path: PathBuf, reason: String },

    #[error("failed to persist {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the error means the descriptor file simply does not exist.
    pub fn is_config_missing(&self) -> bool {
        matches!(self, Error::ConfigMissing { .. })
    }
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;
