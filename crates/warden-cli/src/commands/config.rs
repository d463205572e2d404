//! Configuration management commands.

use anyhow::Result;

use super::ConfigSource;
use crate::style::{self, colors::SemanticStyle};

#[derive(Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
    Toml,
}

/// Show current configuration.
pub fn show(source: &ConfigSource, format: OutputFormat) -> Result<()> {
    let config = source.load()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        OutputFormat::Toml => {
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{toml_str}");
        }
        OutputFormat::Text => {
            style::print_header("Warden Configuration");
            println!();

            println!("Catalog:");
            println!("  {}", config.catalog.join(", "));
            println!();

            println!("Departments:");
            if config.departments.is_empty() {
                println!("  {}", "(none - only admins see resources)".muted());
            }
            for department in &config.departments {
                println!("  {}: {}", department.name, department.types.join(", "));
            }
            println!();

            println!("Throttle:");
            println!("  Threshold: {}", config.throttle.threshold);
            println!("  Lock duration: {}s", config.throttle.lock_duration_secs);
            println!("  On store failure: {:?}", config.throttle.on_store_failure);
            println!();

            println!("Store:");
            println!("  Attempts file: {}", config.store.attempts_file.display());
        }
    }

    Ok(())
}

/// Validate configuration files.
pub fn validate(source: &ConfigSource) -> Result<()> {
    match source.warden() {
        Ok(_) => {
            style::print_success("Configuration is valid");
            Ok(())
        }
        Err(e) => {
            style::print_error("Configuration validation failed");
            Err(e)
        }
    }
}
