//! Error types shared across the bot

use thiserror::Error;

/// Failure of an OS-level input call
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
    #[error("input simulation is not supported on this platform")]
    Unsupported,
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    #[error("input rejected by the OS: {0}")]
    Rejected(String),
}

/// Failure while loading or validating the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Reasons the fishing loop refuses to start
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("fishing loop is already running")]
    AlreadyRunning,
    #[error("auto purchase is enabled but point(s) {0:?} are not set")]
    PurchasePointsMissing(Vec<u8>),
    #[error("failed to spawn fishing thread: {0}")]
    Spawn(String),
}
