//! Error types for the Warden SDK.

use thiserror::Error;
use warden_config::ConfigError;
use warden_rbac::{GuardError, PolicyError};
use warden_throttle::ThrottleError;

use crate::resources::RepositoryError;

/// Result type for Warden operations.
pub type Result<T> = std::result::Result<T, WardenError>;

/// Errors that can occur in Warden operations.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Configuration could not be turned into policy tables.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Policy construction or rendering failed.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// A management action was denied or its target is missing.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// The attempt store failed.
    #[error("throttle error: {0}")]
    Throttle(#[from] ThrottleError),

    /// The resource repository failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl WardenError {
    /// Returns whether this is a policy denial, as opposed to a missing
    /// resource or an infrastructure failure.
    pub fn is_denied(&self) -> bool {
        matches!(self, WardenError::Guard(e) if e.is_denied())
    }

    /// Returns whether the target resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WardenError::Guard(GuardError::NotFound { .. })
                | WardenError::Repository(RepositoryError::NotFound { .. })
        )
    }
}
