//! Department policies.
//!
//! Maps a department to the resource types its managers may manage and its
//! members may see.

use std::collections::BTreeMap;

use serde::Serialize;
use warden_types::{Department, ResourceType, normalize_department};

use crate::catalog::ResourceCatalog;
use crate::error::{PolicyError, Result};

/// Resource types assigned to one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentEntry {
    /// Department name as configured (trimmed).
    pub name: String,

    /// Assigned types in configured order. Never empty.
    ///
    /// The first entry is the department's primary type, used when a manager
    /// creates a resource without naming a type.
    pub types: Vec<ResourceType>,
}

impl DepartmentEntry {
    pub fn primary_type(&self) -> Option<&ResourceType> {
        self.types.first()
    }
}

/// Mapping from normalized department name to its assigned resource types.
///
/// Departments absent from the mapping see and manage nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentPolicy {
    entries: BTreeMap<String, DepartmentEntry>,
}

impl DepartmentPolicy {
    /// Builds a policy, validating every entry against the catalog.
    ///
    /// **Rejected:**
    /// - Empty department names, and the reserved `"none"`
    /// - Two names that normalize to the same key
    /// - Departments with no types
    /// - Types not in the catalog
    ///
    /// Duplicate types within one department are collapsed.
    pub fn new<I, N, T, S>(catalog: &ResourceCatalog, departments: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, T)>,
        N: AsRef<str>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeMap::new();

        for (name, labels) in departments {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(PolicyError::InvalidConfig(
                    "department name is empty".to_string(),
                ));
            }
            // Principals never carry such a department, so it could not match.
            if Department::parse(name).is_none() {
                return Err(PolicyError::InvalidConfig(format!(
                    "'{name}' is reserved and cannot name a department"
                )));
            }

            let mut types: Vec<ResourceType> = Vec::new();
            for label in labels {
                let resource_type = catalog.resolve(label.as_ref()).ok_or_else(|| {
                    PolicyError::InvalidConfig(format!(
                        "department '{name}' lists '{}' which is not in the catalog",
                        label.as_ref().trim()
                    ))
                })?;
                if !types.contains(resource_type) {
                    types.push(resource_type.clone());
                }
            }

            if types.is_empty() {
                return Err(PolicyError::InvalidConfig(format!(
                    "department '{name}' has no resource types"
                )));
            }

            let key = normalize_department(name);
            let entry = DepartmentEntry {
                name: name.to_string(),
                types,
            };
            if let Some(previous) = entries.insert(key, entry) {
                return Err(PolicyError::InvalidConfig(format!(
                    "department '{name}' collides with '{}'",
                    previous.name
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The department layout the inventory ships with.
    ///
    /// Security manages both security devices and general equipment.
    pub fn standard() -> Self {
        let entry = |name: &str, types: &[&str]| {
            (
                normalize_department(name),
                DepartmentEntry {
                    name: name.to_string(),
                    types: types.iter().map(ResourceType::new).collect(),
                },
            )
        };

        Self {
            entries: BTreeMap::from([
                entry("Transporte", &["Vehicle"]),
                entry("TI", &["Technology"]),
                entry("Segurança", &["SecurityDevice", "Equipment"]),
            ]),
        }
    }

    /// Looks up a department by its normalized key.
    pub fn entry(&self, key: &str) -> Option<&DepartmentEntry> {
        self.entries.get(key)
    }

    /// Looks up a department by free-form name.
    pub fn lookup(&self, department: &str) -> Option<&DepartmentEntry> {
        self.entries.get(&normalize_department(department))
    }

    /// Returns all departments ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = &DepartmentEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
