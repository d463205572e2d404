//! Resource type catalog.
//!
//! The closed set of labels a managed record may be classified with.

use std::collections::BTreeSet;

use serde::Serialize;
use warden_types::ResourceType;

use crate::error::{PolicyError, Result};

/// Closed, ordered set of valid resource-type labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceCatalog {
    types: Vec<ResourceType>,
}

impl ResourceCatalog {
    /// Builds a catalog from labels, preserving their order.
    ///
    /// Labels are trimmed. Empty labels, duplicates, and an empty catalog are
    /// rejected.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut types: Vec<ResourceType> = Vec::new();
        for label in labels {
            let resource_type = ResourceType::new(label);
            if resource_type.as_str().is_empty() {
                return Err(PolicyError::InvalidConfig(
                    "catalog contains an empty label".to_string(),
                ));
            }
            if types.contains(&resource_type) {
                return Err(PolicyError::InvalidConfig(format!(
                    "catalog lists '{resource_type}' more than once"
                )));
            }
            types.push(resource_type);
        }

        if types.is_empty() {
            return Err(PolicyError::InvalidConfig("catalog is empty".to_string()));
        }

        Ok(Self { types })
    }

    /// The five resource types the inventory ships with.
    pub fn standard() -> Self {
        Self {
            types: ["Equipment", "Vehicle", "SecurityDevice", "Technology", "Furniture"]
                .into_iter()
                .map(ResourceType::new)
                .collect(),
        }
    }

    /// Resolves a free-form label against the catalog.
    ///
    /// Surrounding whitespace is ignored; matching is otherwise exact.
    pub fn resolve(&self, label: &str) -> Option<&ResourceType> {
        let label = label.trim();
        self.types.iter().find(|t| t.as_str() == label)
    }

    /// Returns whether the catalog contains the given type.
    pub fn contains(&self, resource_type: &ResourceType) -> bool {
        self.types.contains(resource_type)
    }

    /// Returns all types in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.iter()
    }

    /// Returns the whole catalog as a set.
    pub fn to_set(&self) -> BTreeSet<ResourceType> {
        self.types.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = ResourceCatalog::standard();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.resolve("Vehicle").is_some());
        assert!(catalog.resolve("  Vehicle ").is_some());
        assert!(catalog.resolve("vehicle").is_none());
        assert!(catalog.resolve("Spaceship").is_none());
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = ResourceCatalog::new(["Vehicle", " Vehicle"]);
        assert!(matches!(result, Err(PolicyError::InvalidConfig(_))));
    }

    #[test]
    fn test_catalog_rejects_empty() {
        assert!(ResourceCatalog::new(Vec::<String>::new()).is_err());
        assert!(ResourceCatalog::new(["Vehicle", "  "]).is_err());
    }

    #[test]
    fn test_catalog_preserves_order() {
        let catalog = ResourceCatalog::new(["B", "A", "C"]).unwrap();
        let labels: Vec<&str> = catalog.iter().map(ResourceType::as_str).collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
    }
}
