//! Access policy engine.
//!
//! Answers "which types can this principal see or manage?" and "may this
//! principal touch this type?". Every answer is a pure function of the
//! principal and the injected catalog and department policy.

use std::collections::BTreeSet;
use std::sync::Arc;

use warden_types::{Action, Principal, ResourceType, Role};

use crate::catalog::ResourceCatalog;
use crate::error::{PolicyError, Result};
use crate::policy::{DepartmentEntry, DepartmentPolicy};
use crate::scope::ViewScope;

#[derive(Debug)]
struct Tables {
    catalog: ResourceCatalog,
    departments: DepartmentPolicy,
}

/// Department-scoped access policy engine.
///
/// Cloning is cheap; clones share the same tables.
///
/// | Role     | Manageable                | Viewable                  |
/// |----------|---------------------------|---------------------------|
/// | Admin    | whole catalog             | whole catalog (no filter) |
/// | Manager  | department's types        | department's types        |
/// | Employee | nothing                   | department's types        |
#[derive(Debug, Clone)]
pub struct AccessPolicyEngine {
    tables: Arc<Tables>,
}

impl AccessPolicyEngine {
    /// Creates an engine over the given catalog and department policy.
    pub fn new(catalog: ResourceCatalog, departments: DepartmentPolicy) -> Self {
        Self {
            tables: Arc::new(Tables {
                catalog,
                departments,
            }),
        }
    }

    /// Engine over [`ResourceCatalog::standard`] and [`DepartmentPolicy::standard`].
    pub fn standard() -> Self {
        Self::new(ResourceCatalog::standard(), DepartmentPolicy::standard())
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.tables.catalog
    }

    pub fn departments(&self) -> &DepartmentPolicy {
        &self.tables.departments
    }

    /// Department entry for the principal, if mapped.
    fn department_entry(&self, principal: &Principal) -> Option<&DepartmentEntry> {
        principal
            .department_key()
            .and_then(|key| self.tables.departments.entry(key))
    }

    /// Types assigned to the principal's department, or the empty set.
    fn department_types(&self, principal: &Principal) -> BTreeSet<ResourceType> {
        self.department_entry(principal)
            .map(|entry| entry.types.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Types the principal may create, update or delete.
    ///
    /// - Admin: the whole catalog, regardless of department
    /// - Manager: the department's types, or nothing if unmapped
    /// - Employee: nothing, regardless of department
    pub fn manageable_types(&self, principal: &Principal) -> BTreeSet<ResourceType> {
        let role = principal.role();
        if !role.may_mutate() {
            BTreeSet::new()
        } else if role.is_unrestricted() {
            self.tables.catalog.to_set()
        } else {
            self.department_types(principal)
        }
    }

    /// Types the principal's queries are scoped to.
    ///
    /// Admins see the whole catalog. Everyone else sees their department's
    /// types, or nothing if the department is absent or unmapped.
    pub fn viewable_types(&self, principal: &Principal) -> BTreeSet<ResourceType> {
        if principal.role().is_unrestricted() {
            self.tables.catalog.to_set()
        } else {
            self.department_types(principal)
        }
    }

    /// Query scope for the principal.
    ///
    /// Admins get [`ViewScope::Unrestricted`] so that records whose type has
    /// since left the catalog stay visible to them.
    pub fn view_scope(&self, principal: &Principal) -> ViewScope {
        if principal.role().is_unrestricted() {
            ViewScope::Unrestricted
        } else {
            ViewScope::restricted(self.department_types(principal))
        }
    }

    /// Returns whether the principal may perform `action` on resources
    /// labelled `resource_type`.
    ///
    /// The decision does not depend on the action. Labels outside the catalog
    /// are never manageable.
    pub fn can_manage(&self, principal: &Principal, resource_type: &str, _action: Action) -> bool {
        match self.tables.catalog.resolve(resource_type) {
            Some(resource_type) => self.can_manage_type(principal, resource_type),
            None => false,
        }
    }

    /// Same as [`can_manage`](Self::can_manage) for an already resolved type.
    pub fn can_manage_type(&self, principal: &Principal, resource_type: &ResourceType) -> bool {
        let role = principal.role();
        if !role.may_mutate() {
            false
        } else if role.is_unrestricted() {
            self.tables.catalog.contains(resource_type)
        } else {
            self.department_entry(principal)
                .is_some_and(|entry| entry.types.contains(resource_type))
        }
    }

    /// Resolves a free-form label against the catalog.
    pub fn resolve_type(&self, label: &str) -> Result<ResourceType> {
        self.tables
            .catalog
            .resolve(label)
            .cloned()
            .ok_or_else(|| PolicyError::UnknownType {
                label: label.trim().to_string(),
            })
    }

    /// Determines the type a new resource is stored with.
    ///
    /// - Admin: the requested type, which must be in the catalog
    /// - Manager without a requested type: the department's primary type
    /// - Manager with a requested type: accepted only if manageable
    /// - Employee: denied
    ///
    /// A manager's creatable types are exactly their manageable types, so the
    /// create-time and edit-time checks cannot disagree.
    pub fn creation_type(
        &self,
        principal: &Principal,
        requested: Option<&str>,
    ) -> Result<ResourceType> {
        let requested = requested.map(str::trim).filter(|label| !label.is_empty());

        match (principal.role(), requested) {
            (Role::Admin, Some(label)) => self.resolve_type(label),
            (Role::Manager, None) => self
                .department_entry(principal)
                .and_then(DepartmentEntry::primary_type)
                .cloned()
                .ok_or_else(|| PolicyError::NoAssignedType {
                    principal: principal.clone(),
                }),
            (Role::Manager, Some(label)) => {
                let resource_type = self.resolve_type(label)?;
                if self.can_manage_type(principal, &resource_type) {
                    Ok(resource_type)
                } else {
                    Err(PolicyError::NotManageable {
                        principal: principal.clone(),
                        resource_type,
                    })
                }
            }
            (Role::Admin | Role::Employee, None) => Err(PolicyError::NoAssignedType {
                principal: principal.clone(),
            }),
            (Role::Employee, Some(label)) => Err(PolicyError::NotManageable {
                principal: principal.clone(),
                resource_type: ResourceType::new(label),
            }),
        }
    }
}

impl Default for AccessPolicyEngine {
    fn default() -> Self {
        Self::standard()
    }
}
