//! Resource management behind the access policy.
//!
//! The repository is the external CRUD collaborator; [`ResourceService`]
//! scopes every read with the principal's [`ViewScope`] and runs the
//! management guard before every mutating call.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use warden_rbac::{GuardError, ManagementGuard, Mutation, ViewScope};
use warden_types::{Principal, ResourceType};

use crate::error::Result;

// ============================================================================
// Resource
// ============================================================================

/// Identifier assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operational status shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceStatus {
    #[default]
    Operational,
    Maintenance,
    Inactive,
}

impl ResourceStatus {
    pub const ALL: [ResourceStatus; 3] = [
        ResourceStatus::Operational,
        ResourceStatus::Maintenance,
        ResourceStatus::Inactive,
    ];
}

impl Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceStatus::Operational => "Operational",
            ResourceStatus::Maintenance => "Maintenance",
            ResourceStatus::Inactive => "Inactive",
        })
    }
}

/// A managed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
}

/// Input for creating a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceDraft {
    pub name: String,

    /// Requested type label. Managers may leave this empty to get their
    /// department's primary type.
    pub resource_type: Option<String>,
    pub status: ResourceStatus,
}

/// Fields to change on an existing resource. `None` leaves a field as is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceChanges {
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub status: Option<ResourceStatus>,
}

/// A resource about to be inserted; the type is already authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub name: String,
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
}

// ============================================================================
// Status summary
// ============================================================================

/// Per-status counts over a set of resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub operational: usize,
    pub maintenance: usize,
    pub inactive: usize,
}

impl StatusSummary {
    pub fn tally<'a>(resources: impl IntoIterator<Item = &'a Resource>) -> Self {
        resources
            .into_iter()
            .fold(Self::default(), |mut summary, resource| {
                summary.total += 1;
                match resource.status {
                    ResourceStatus::Operational => summary.operational += 1,
                    ResourceStatus::Maintenance => summary.maintenance += 1,
                    ResourceStatus::Inactive => summary.inactive += 1,
                }
                summary
            })
    }

    pub fn count(&self, status: ResourceStatus) -> usize {
        match status {
            ResourceStatus::Operational => self.operational,
            ResourceStatus::Maintenance => self.maintenance,
            ResourceStatus::Inactive => self.inactive,
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

/// Failure of the resource repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("resource '{id}' not found")]
    NotFound { id: ResourceId },

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// The CRUD collaborator that holds resources.
///
/// `list` must honor the scope: [`ViewScope::Nothing`] yields no rows.
pub trait ResourceRepository: Send + Sync {
    fn get(&self, id: &ResourceId) -> std::result::Result<Option<Resource>, RepositoryError>;

    fn list(&self, scope: &ViewScope) -> std::result::Result<Vec<Resource>, RepositoryError>;

    fn insert(&self, resource: NewResource) -> std::result::Result<Resource, RepositoryError>;

    fn update(&self, resource: &Resource) -> std::result::Result<(), RepositoryError>;

    fn delete(&self, id: &ResourceId) -> std::result::Result<(), RepositoryError>;
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<ResourceId, Resource>,
    next_id: u64,
    writes: u64,
}

/// In-memory repository, ordered by id.
#[derive(Debug, Default)]
pub struct MemoryResources {
    table: RwLock<Table>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls that reached the repository.
    pub fn write_count(&self) -> u64 {
        self.table.read().map_or(0, |t| t.writes)
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Unavailable("resource table lock poisoned".to_string())
    }
}

impl ResourceRepository for MemoryResources {
    fn get(&self, id: &ResourceId) -> std::result::Result<Option<Resource>, RepositoryError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.get(id).cloned())
    }

    fn list(&self, scope: &ViewScope) -> std::result::Result<Vec<Resource>, RepositoryError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table
            .rows
            .values()
            .filter(|r| scope.allows(&r.resource_type))
            .cloned()
            .collect())
    }

    fn insert(&self, resource: NewResource) -> std::result::Result<Resource, RepositoryError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        table.next_id += 1;
        table.writes += 1;
        let stored = Resource {
            id: ResourceId::new(format!("r{:04}", table.next_id)),
            name: resource.name,
            resource_type: resource.resource_type,
            status: resource.status,
        };
        table.rows.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn update(&self, resource: &Resource) -> std::result::Result<(), RepositoryError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        table.writes += 1;
        match table.rows.get_mut(&resource.id) {
            Some(row) => {
                *row = resource.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                id: resource.id.clone(),
            }),
        }
    }

    fn delete(&self, id: &ResourceId) -> std::result::Result<(), RepositoryError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        table.writes += 1;
        table
            .rows
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound { id: id.clone() })
    }
}

// ============================================================================
// Service
// ============================================================================

/// Resource operations on behalf of a principal.
#[derive(Debug)]
pub struct ResourceService<R> {
    guard: ManagementGuard,
    repository: R,
}

impl<R: ResourceRepository> ResourceService<R> {
    pub fn new(guard: ManagementGuard, repository: R) -> Self {
        Self { guard, repository }
    }

    pub fn guard(&self) -> &ManagementGuard {
        &self.guard
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Resources the principal may see.
    pub fn list(&self, principal: &Principal) -> Result<Vec<Resource>> {
        let scope = self.guard.engine().view_scope(principal);
        if scope == ViewScope::Nothing {
            debug!(principal = %principal, "Empty view scope");
        }
        Ok(self.repository.list(&scope)?)
    }

    /// Fetches one resource. Resources outside the principal's view read as
    /// not found.
    pub fn get(&self, principal: &Principal, id: &ResourceId) -> Result<Resource> {
        self.fetch_visible(principal, id)?
            .ok_or_else(|| not_found(id))
    }

    /// Fresh copy of a resource, `None` when missing or outside the view.
    fn fetch_visible(&self, principal: &Principal, id: &ResourceId) -> Result<Option<Resource>> {
        let scope = self.guard.engine().view_scope(principal);
        Ok(self
            .repository
            .get(id)?
            .filter(|r| scope.allows(&r.resource_type)))
    }

    /// Types to offer in the editable type selector.
    pub fn selectable_types(&self, principal: &Principal) -> Vec<ResourceType> {
        self.guard.selectable_types(principal)
    }

    /// Opens a resource for editing: fetches it fresh and checks the principal
    /// may manage its type. Resources outside the view read as not found.
    pub fn open_for_edit(&self, principal: &Principal, id: &ResourceId) -> Result<Resource> {
        let existing = self.fetch_visible(principal, id)?;
        self.guard.authorize_edit(
            principal,
            id.as_str(),
            existing.as_ref().map(|r| r.resource_type.as_str()),
        )?;
        existing.ok_or_else(|| not_found(id))
    }

    /// Creates a resource. The stored type is the one the guard derives.
    pub fn create(&self, principal: &Principal, draft: ResourceDraft) -> Result<Resource> {
        let resource_type = self.guard.authorize_mutation(
            principal,
            Mutation::Create {
                requested_type: draft.resource_type.as_deref(),
            },
        )?;

        Ok(self.repository.insert(NewResource {
            name: draft.name,
            resource_type,
            status: draft.status,
        })?)
    }

    /// Applies `changes` to a resource.
    ///
    /// The stored type and the new type must both be manageable.
    pub fn update(
        &self,
        principal: &Principal,
        id: &ResourceId,
        changes: ResourceChanges,
    ) -> Result<Resource> {
        let current = self.fetch_visible(principal, id)?;
        let resource_type = self.guard.authorize_mutation(
            principal,
            Mutation::Update {
                id: id.as_str(),
                current_type: current.as_ref().map(|r| r.resource_type.as_str()),
                new_type: changes.resource_type.as_deref(),
            },
        )?;
        let mut resource = current.ok_or_else(|| not_found(id))?;

        resource.resource_type = resource_type;
        if let Some(name) = changes.name {
            resource.name = name;
        }
        if let Some(status) = changes.status {
            resource.status = status;
        }

        self.repository.update(&resource)?;
        Ok(resource)
    }

    pub fn delete(&self, principal: &Principal, id: &ResourceId) -> Result<()> {
        let current = self.fetch_visible(principal, id)?;
        self.guard.authorize_mutation(
            principal,
            Mutation::Delete {
                id: id.as_str(),
                current_type: current.as_ref().map(|r| r.resource_type.as_str()),
            },
        )?;
        Ok(self.repository.delete(id)?)
    }

    /// Status counts over what the principal can see.
    pub fn summary(&self, principal: &Principal) -> Result<StatusSummary> {
        let resources = self.list(principal)?;
        Ok(StatusSummary::tally(&resources))
    }
}

fn not_found(id: &ResourceId) -> crate::WardenError {
    GuardError::NotFound { id: id.to_string() }.into()
}
