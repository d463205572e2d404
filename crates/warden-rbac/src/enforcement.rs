//! Policy enforcement at the management checkpoints.
//!
//! A management action is checked three times, each against whatever data is
//! at hand at that moment:
//! 1. When the editable type selector is populated ([`ManagementGuard::selectable_types`])
//! 2. When an edit/delete affordance is opened on a freshly fetched resource
//!    ([`ManagementGuard::authorize_edit`])
//! 3. Immediately before the mutating call is issued ([`ManagementGuard::authorize_mutation`])

use thiserror::Error;
use tracing::{info, warn};
use warden_types::{Action, Principal, ResourceType};

use crate::engine::AccessPolicyEngine;
use crate::error::PolicyError;

/// Error type for management enforcement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// The principal may not perform this action.
    #[error("Not permitted: {reason}")]
    Denied { action: Action, reason: String },

    /// The resource does not exist (or no longer exists).
    #[error("Resource '{id}' not found")]
    NotFound { id: String },
}

impl GuardError {
    pub fn is_denied(&self) -> bool {
        matches!(self, GuardError::Denied { .. })
    }
}

/// Result type for enforcement operations.
pub type Result<T> = std::result::Result<T, GuardError>;

/// A mutating call about to be issued to the resource store.
///
/// `current_type` is the stored type of the target as freshly fetched, or
/// `None` if the target was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation<'a> {
    Create {
        requested_type: Option<&'a str>,
    },
    Update {
        id: &'a str,
        current_type: Option<&'a str>,
        new_type: Option<&'a str>,
    },
    Delete {
        id: &'a str,
        current_type: Option<&'a str>,
    },
}

impl Mutation<'_> {
    pub fn action(&self) -> Action {
        match self {
            Mutation::Create { .. } => Action::Create,
            Mutation::Update { .. } => Action::Update,
            Mutation::Delete { .. } => Action::Delete,
        }
    }
}

/// Enforces the access policy at each management checkpoint.
///
/// **Audit:** grants are logged at `info`, denials at `warn`.
#[derive(Debug, Clone)]
pub struct ManagementGuard {
    engine: AccessPolicyEngine,

    /// Whether to log decisions.
    audit_enabled: bool,
}

impl ManagementGuard {
    /// Creates a new guard over the given engine.
    pub fn new(engine: AccessPolicyEngine) -> Self {
        Self {
            engine,
            audit_enabled: true,
        }
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn engine(&self) -> &AccessPolicyEngine {
        &self.engine
    }

    /// Checkpoint 1: types offered in an editable type selector.
    ///
    /// Returns catalog order. Empty for principals that cannot manage anything.
    pub fn selectable_types(&self, principal: &Principal) -> Vec<ResourceType> {
        let manageable = self.engine.manageable_types(principal);
        self.engine
            .catalog()
            .iter()
            .filter(|t| manageable.contains(*t))
            .cloned()
            .collect()
    }

    /// Returns whether the type selector should be locked for this principal.
    ///
    /// Managers with a single assigned type get a fixed selector.
    pub fn type_selector_locked(&self, principal: &Principal) -> bool {
        self.selectable_types(principal).len() <= 1
    }

    /// Checkpoint 2: opening an edit or delete affordance.
    ///
    /// `existing_type` is the type of the freshly fetched resource, or `None`
    /// if the fetch found nothing.
    pub fn authorize_edit(
        &self,
        principal: &Principal,
        id: &str,
        existing_type: Option<&str>,
    ) -> Result<()> {
        let Some(existing_type) = existing_type else {
            return Err(GuardError::NotFound { id: id.to_string() });
        };
        self.check(principal, Action::Update, existing_type)?;
        Ok(())
    }

    /// Checkpoint 3: immediately before the mutating call.
    ///
    /// Returns the type the resource will carry after the mutation:
    /// - Create: the derived creation type
    /// - Update: the new type, or the current type when unchanged; both the
    ///   current and the new type must be manageable
    /// - Delete: the current type
    pub fn authorize_mutation(
        &self,
        principal: &Principal,
        mutation: Mutation<'_>,
    ) -> Result<ResourceType> {
        let action = mutation.action();
        match mutation {
            Mutation::Create { requested_type } => {
                match self.engine.creation_type(principal, requested_type) {
                    Ok(resource_type) => {
                        self.audit_grant(principal, action, &resource_type);
                        Ok(resource_type)
                    }
                    Err(e) => Err(self.deny(principal, action, &e)),
                }
            }
            Mutation::Update {
                id,
                current_type,
                new_type,
            } => {
                let current_type = current_type.ok_or_else(|| GuardError::NotFound {
                    id: id.to_string(),
                })?;
                let current = self.check(principal, action, current_type)?;
                match new_type.map(str::trim).filter(|t| !t.is_empty()) {
                    Some(new_type) if new_type != current.as_str() => {
                        self.check(principal, action, new_type)
                    }
                    _ => Ok(current),
                }
            }
            Mutation::Delete { id, current_type } => {
                let current_type = current_type.ok_or_else(|| GuardError::NotFound {
                    id: id.to_string(),
                })?;
                self.check(principal, action, current_type)
            }
        }
    }

    fn check(&self, principal: &Principal, action: Action, label: &str) -> Result<ResourceType> {
        let resource_type = match self.engine.resolve_type(label) {
            Ok(resource_type) => resource_type,
            Err(e) => return Err(self.deny(principal, action, &e)),
        };

        if self.engine.can_manage_type(principal, &resource_type) {
            self.audit_grant(principal, action, &resource_type);
            Ok(resource_type)
        } else {
            let e = PolicyError::NotManageable {
                principal: principal.clone(),
                resource_type,
            };
            Err(self.deny(principal, action, &e))
        }
    }

    fn audit_grant(&self, principal: &Principal, action: Action, resource_type: &ResourceType) {
        if self.audit_enabled {
            info!(
                role = %principal.role(),
                department = ?principal.department().map(|d| d.name()),
                %action,
                resource_type = %resource_type,
                "Management access granted"
            );
        }
    }

    fn deny(&self, principal: &Principal, action: Action, cause: &PolicyError) -> GuardError {
        if self.audit_enabled {
            warn!(
                role = %principal.role(),
                department = ?principal.department().map(|d| d.name()),
                %action,
                reason = %cause,
                "Management access denied"
            );
        }
        GuardError::Denied {
            action,
            reason: cause.to_string(),
        }
    }
}
