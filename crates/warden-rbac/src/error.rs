//! Error types for policy construction and evaluation.

use thiserror::Error;
use warden_types::{Principal, ResourceType};

/// Error type for the access policy engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The catalog or department mapping is malformed.
    #[error("Invalid policy configuration: {0}")]
    InvalidConfig(String),

    /// A label that is not part of the catalog.
    #[error("Unrecognized resource type '{label}'")]
    UnknownType { label: String },

    /// The principal may not manage resources of this type.
    #[error("{principal} may not manage resources of type '{resource_type}'")]
    NotManageable {
        principal: Principal,
        resource_type: ResourceType,
    },

    /// The principal has no department-assigned type to create resources with.
    #[error("{principal} has no assigned resource type")]
    NoAssignedType { principal: Principal },

    /// A catalog label cannot be rendered safely into a query filter.
    #[error("Unsafe label in view filter: {0:?}")]
    UnsafeLabel(String),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
