//! Configuration management for Warden
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (WARDEN_* prefix, `__` between sections)
//! 2. warden.local.toml (gitignored, local overrides)
//! 3. warden.toml (git-tracked, project config)
//! 4. ~/.config/warden/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! The catalog and department mapping are plain data here. [`WardenConfig::validate`]
//! checks them by building the policy tables they describe.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use warden_rbac::{DepartmentPolicy, ResourceCatalog};
use warden_throttle::{StoreFailurePolicy, ThrottleConfig};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main Warden configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Resource type labels, in display order.
    pub catalog: Vec<String>,
    pub departments: Vec<DepartmentConfig>,
    pub throttle: ThrottleSettings,
    pub store: StoreSettings,
}

impl Default for WardenConfig {
    fn default() -> Self {
        let catalog = ResourceCatalog::standard()
            .iter()
            .map(ToString::to_string)
            .collect();
        let departments = DepartmentPolicy::standard()
            .iter()
            .map(|entry| DepartmentConfig {
                name: entry.name.clone(),
                types: entry.types.iter().map(ToString::to_string).collect(),
            })
            .collect();

        Self {
            catalog,
            departments,
            throttle: ThrottleSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

/// One department and the resource types it sees and manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentConfig {
    pub name: String,

    /// The first type is the one managers create resources with.
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleSettings {
    pub threshold: u32,
    pub lock_duration_secs: u64,
    pub on_store_failure: StoreFailurePolicy,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        let defaults = ThrottleConfig::default();
        Self {
            threshold: defaults.threshold,
            lock_duration_secs: defaults.lock_duration.as_secs(),
            on_store_failure: defaults.on_store_failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub attempts_file: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            attempts_file: PathBuf::from(".warden/attempts.json"),
        }
    }
}

impl WardenConfig {
    /// Load configuration from default locations
    pub fn load() -> anyhow::Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Load a single TOML file, without layering.
    ///
    /// Missing sections take their defaults. Relative paths resolve against
    /// the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Builds the resource catalog.
    pub fn resource_catalog(&self) -> Result<ResourceCatalog, ConfigError> {
        ResourceCatalog::new(&self.catalog).map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Builds the catalog and the department mapping checked against it.
    pub fn policy_tables(&self) -> Result<(ResourceCatalog, DepartmentPolicy), ConfigError> {
        let catalog = self.resource_catalog()?;
        let departments = DepartmentPolicy::new(
            &catalog,
            self.departments
                .iter()
                .map(|d| (d.name.as_str(), d.types.iter().map(String::as_str))),
        )
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok((catalog, departments))
    }

    /// Throttle parameters in the form the throttle consumes.
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig::new(
            self.throttle.threshold,
            Duration::from_secs(self.throttle.lock_duration_secs),
        )
        .with_store_failure(self.throttle.on_store_failure)
    }

    /// Checks everything that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy_tables()?;

        if self.throttle.threshold == 0 {
            return Err(ConfigError::Validation(
                "throttle.threshold must be at least 1".to_string(),
            ));
        }
        if self.throttle.lock_duration_secs == 0 {
            return Err(ConfigError::Validation(
                "throttle.lock_duration_secs must be at least 1".to_string(),
            ));
        }
        if self.store.attempts_file.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "store.attempts_file is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.store.attempts_file.is_relative() {
            self.store.attempts_file = base.join(&self.store.attempts_file);
        }
    }
}
