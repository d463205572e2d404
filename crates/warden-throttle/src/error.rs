//! Error types for attempt throttling.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the attempt-record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on attempt store {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Attempt store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Timed out waiting for lock on {path}")]
    LockTimeout { path: PathBuf },

    #[error("Attempt store lock poisoned")]
    Poisoned,

    #[error("Attempt store unavailable: {0}")]
    Unavailable(String),
}

/// Error type for throttle operations.
///
/// Kept distinct from a normal allowed/denied decision so callers choose
/// between failing open and failing closed explicitly.
#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("Attempt store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Result type for throttle operations.
pub type Result<T> = std::result::Result<T, ThrottleError>;
