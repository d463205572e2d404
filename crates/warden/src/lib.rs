//! # Warden
//!
//! Department-scoped access control and login throttling for a resource
//! inventory.
//!
//! Two decision engines sit at the core:
//!
//! - **Access policy** ([`AccessPolicyEngine`]) - which resource types a
//!   principal may see and manage, given their role and department
//! - **Attempt throttle** ([`AttemptThrottle`]) - locks a login identity out
//!   for a fixed time after repeated failures
//!
//! This crate wires them to their collaborators:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌─────────────────────┐
//! │ LoginGate    │ → │ IdentityProvider │ → │ SafeResolver        │
//! │ (throttle)   │   │ (credentials)    │   │ (profile→Principal) │
//! └──────────────┘   └──────────────────┘   └──────────┬──────────┘
//!                                                      ▼
//!                    ┌──────────────────────────────────────────────┐
//!                    │ ResourceService                               │
//!                    │  list/get: ViewScope   create/update/delete:  │
//!                    │  ManagementGuard before the repository call   │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use warden::{MemoryResources, ResourceDraft, Warden, WardenConfig};
//! use warden_types::Principal;
//!
//! let warden = Warden::from_config(&WardenConfig::default())?;
//! let resources = warden.resources(MemoryResources::new());
//!
//! let manager = Principal::manager("Transporte");
//! let truck = resources.create(&manager, ResourceDraft {
//!     name: "Truck 12".to_string(),
//!     ..ResourceDraft::default()
//! })?;
//! assert_eq!(truck.resource_type.as_str(), "Vehicle");
//!
//! // Departments without a mapping see nothing.
//! assert!(resources.list(&Principal::employee("Marketing"))?.is_empty());
//! # Ok::<(), warden::WardenError>(())
//! ```

mod error;
mod login;
mod resolver;
mod resources;
mod warden;

// SDK Layer - Main API
pub use error::{Result, WardenError};
pub use login::{AuthFailure, IdentityProvider, LoginGate, LoginOutcome};
pub use resolver::{ProfileResolver, ResolveError, SafeResolver, StaticProfiles};
pub use resources::{
    MemoryResources, NewResource, RepositoryError, Resource, ResourceChanges, ResourceDraft,
    ResourceId, ResourceRepository, ResourceService, ResourceStatus, StatusSummary,
};
pub use warden::Warden;

// Re-export configuration
pub use warden_config::{ConfigLoader, WardenConfig};

// Re-export policy types
pub use warden_rbac::{
    AccessPolicyEngine, DepartmentPolicy, GuardError, ManagementGuard, Mutation, PolicyError,
    ResourceCatalog, ViewScope,
};

// Re-export throttle types
pub use warden_throttle::{
    AttemptRecord, AttemptStore, AttemptThrottle, Clock, Decision, FileAttemptStore, LoginNotice,
    ManualClock, MemoryAttemptStore, Outcome, RecordResult, StoreFailurePolicy, SystemClock,
    ThrottleConfig, ThrottleError, ThrottleState, remaining_minutes,
};

// Re-export core types
pub use warden_types::{Action, Identity, Principal, RawProfile, ResourceType, Role};
