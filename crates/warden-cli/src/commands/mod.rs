//! CLI command implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use warden::{Warden, WardenConfig};

pub mod access;
pub mod attempts;
pub mod config;
pub mod version;

/// Where to read configuration from.
pub struct ConfigSource {
    pub project: PathBuf,
    pub file: Option<PathBuf>,
}

impl ConfigSource {
    pub fn load(&self) -> Result<WardenConfig> {
        match &self.file {
            Some(file) => WardenConfig::from_file(file)
                .with_context(|| format!("Failed to load {}", file.display())),
            None => WardenConfig::load_from_dir(&self.project)
                .context("Failed to load configuration"),
        }
    }

    pub fn warden(&self) -> Result<Warden> {
        let config = self.load()?;
        Warden::from_config(&config).context("Configuration rejected")
    }
}
