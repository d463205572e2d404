//! Configuration loader with multi-source merging

use crate::{Paths, StoreSettings, ThrottleSettings, WardenConfig};
use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

/// Scalar defaults fed to the layering as the lowest source.
///
/// The catalog and departments are lists, which the layering merges element
/// by element; seeding them here would pad a shorter project list with
/// default entries. They default at deserialization instead.
#[derive(Serialize)]
struct LayerDefaults {
    throttle: ThrottleSettings,
    store: StoreSettings,
}

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "WARDEN".to_string(),
            include_user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "WARDEN")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/warden/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<WardenConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = LayerDefaults {
            throttle: ThrottleSettings::default(),
            store: StoreSettings::default(),
        };
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/warden/config.toml)
        let user_config_file = self
            .include_user_config
            .then(|| Paths::new().user_config_file().ok())
            .flatten();
        if let Some(user_config_file) = user_config_file {
            builder = builder.add_source(
                config::File::from(user_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 3. Project config (warden.toml)
        builder = builder.add_source(
            config::File::from(Paths::project_config_file(&self.project_dir))
                .required(false)
                .format(config::FileFormat::Toml),
        );

        // 4. Local config (warden.local.toml, gitignored)
        builder = builder.add_source(
            config::File::from(Paths::local_config_file(&self.project_dir))
                .required(false)
                .format(config::FileFormat::Toml),
        );

        // 5. Environment variables (WARDEN_THROTTLE__THRESHOLD=5)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let mut warden_config: WardenConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        warden_config
            .validate()
            .context("Configuration failed validation")?;

        // Resolve relative paths
        warden_config.resolve_paths(&self.project_dir);

        Ok(warden_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
