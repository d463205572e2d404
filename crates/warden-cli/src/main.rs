//! Warden CLI.
//!
//! Inspects the effective access policy and the durable login-attempt store.
//!
//! # Quick Start
//!
//! ```bash
//! # What can a Security manager touch?
//! warden access --role manager --department "Segurança" --type Vehicle
//!
//! # Why can't this person log in?
//! warden attempts status carla@example.com
//! warden attempts clear carla@example.com
//! ```

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Warden - department-scoped access control and login throttling.
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory holding warden.toml.
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Load this file only, instead of the layered configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show what a role and department may see and manage.
    Access {
        /// Role (admin, manager, employee). Unknown roles get least privilege.
        #[arg(short, long)]
        role: String,

        /// Department name.
        #[arg(short, long)]
        department: Option<String>,

        /// Resource type to check management rights for.
        #[arg(short = 't', long = "type")]
        resource_type: Option<String>,

        /// Column name used when rendering the view filter.
        #[arg(long, default_value = "type")]
        column: String,
    },

    /// Login attempt records.
    #[command(subcommand)]
    Attempts(AttemptCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Validate the configuration.
    Validate,
}

#[derive(Subcommand)]
enum AttemptCommands {
    /// Show the lockout state of an identity.
    Status {
        /// Login identity (email).
        identity: String,
    },

    /// Remove the attempt record of an identity, lifting any lockout.
    Clear {
        /// Login identity (email).
        identity: String,
    },

    /// List all stored attempt records.
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Toml,
}

fn main() -> Result<()> {
    // Logs go to stderr so command output stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color);

    let source = commands::ConfigSource {
        project: cli.project,
        file: cli.config,
    };

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Config(ConfigCommands::Show { format }) => {
            commands::config::show(&source, format.into())
        }
        Commands::Config(ConfigCommands::Validate) => commands::config::validate(&source),
        Commands::Access {
            role,
            department,
            resource_type,
            column,
        } => commands::access::run(
            &source,
            &role,
            department.as_deref(),
            resource_type.as_deref(),
            &column,
        ),
        Commands::Attempts(AttemptCommands::Status { identity }) => {
            commands::attempts::status(&source, &identity)
        }
        Commands::Attempts(AttemptCommands::Clear { identity }) => {
            commands::attempts::clear(&source, &identity)
        }
        Commands::Attempts(AttemptCommands::List) => commands::attempts::list(&source),
    }
}

impl From<Format> for commands::config::OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => Self::Text,
            Format::Json => Self::Json,
            Format::Toml => Self::Toml,
        }
    }
}
