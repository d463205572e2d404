//! # warden-rbac: Department-scoped access control
//!
//! Decides which resource types a principal may see and manage:
//! - **Resource type catalog** (closed set of labels)
//! - **Department policy** (department → assigned types)
//! - **Access policy engine** (manageable/viewable sets, `can_manage`)
//! - **View scope** (query filter that never degrades to "no filter")
//! - **Management guard** (the three checkpoints before a mutation)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Principal + intended action + type          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AccessPolicyEngine                          │
//! │  ├─ ResourceCatalog                          │
//! │  └─ DepartmentPolicy                         │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  ManagementGuard / ViewScope                 │
//! │  - Denied before any mutating call           │
//! │  - Empty scope renders as FALSE              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Roles
//!
//! | Role     | View                | Create/Update/Delete |
//! |----------|---------------------|----------------------|
//! | Employee | department's types  | ✗                    |
//! | Manager  | department's types  | department's types   |
//! | Admin    | everything          | whole catalog        |
//!
//! ## Examples
//!
//! ```
//! use warden_rbac::{AccessPolicyEngine, ManagementGuard, Mutation, ViewScope};
//! use warden_types::{Action, Principal};
//!
//! let engine = AccessPolicyEngine::standard();
//!
//! let manager = Principal::manager("Transporte");
//! assert!(engine.can_manage(&manager, "Vehicle", Action::Update));
//! assert!(!engine.can_manage(&manager, "Technology", Action::Update));
//!
//! // Unmapped departments see nothing, not everything.
//! let stranger = Principal::employee("Marketing");
//! assert_eq!(engine.view_scope(&stranger), ViewScope::Nothing);
//! assert_eq!(engine.view_scope(&stranger).to_where_clause("type")?, "FALSE");
//!
//! // Final check before the store is touched.
//! let guard = ManagementGuard::new(engine);
//! let stored_as = guard.authorize_mutation(&manager, Mutation::Create { requested_type: None })?;
//! assert_eq!(stored_as.as_str(), "Vehicle");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod enforcement;
pub mod engine;
pub mod error;
pub mod policy;
pub mod scope;

// Re-export commonly used types
pub use catalog::ResourceCatalog;
pub use enforcement::{GuardError, ManagementGuard, Mutation};
pub use engine::AccessPolicyEngine;
pub use error::PolicyError;
pub use policy::{DepartmentEntry, DepartmentPolicy};
pub use scope::ViewScope;
