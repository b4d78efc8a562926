//! Command-line interface for prefetch.
//!
//! # Available Commands
//!
//! - `plan` - Fetch the repository indexes and show which artifacts an
//!   offline package build would cache
//! - `package` - Fill the dependency cache for an offline package build
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all log output except errors
//! - `--settings` - Path to the settings file (default `prefetch.toml`)
//!
//! ```bash
//! prefetch plan --format json
//! prefetch --verbose package --offline --max-parallel 4
//! ```

pub mod common;
mod package;
mod plan;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::constants::SETTINGS_FILE_NAME;
use common::CommandExecutor;

pub use package::PackageCommand;
pub use plan::{OutputFormat, PlanCommand};

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests and embedders can run a command
/// without touching process-wide state such as the log subscriber.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`, then `info`.
    pub log_level: Option<String>,

    /// Settings file to load.
    pub settings_path: PathBuf,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_level: None,
            settings_path: PathBuf::from(SETTINGS_FILE_NAME),
        }
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing when a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Offline dependency-cache planner.
#[derive(Parser, Debug)]
#[command(
    name = "prefetch",
    about = "Pre-populate the dependency cache for offline package builds",
    version,
    long_about = "Walks the component configuration, resolves every declared dependency \
                  version against its repository index and downloads the matching \
                  artifacts into a local cache."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the settings file
    #[arg(long, global = true, value_name = "PATH", default_value = SETTINGS_FILE_NAME)]
    settings: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the index manifests and artifacts an offline build would cache
    Plan(PlanCommand),

    /// Fill the dependency cache for an offline package build
    Package(PackageCommand),
}

impl Cli {
    /// Execute the selected command with logging set up from the global flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            settings_path: self.settings.clone(),
        }
    }

    /// Execute the selected command without installing a log subscriber.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Plan(cmd) => cmd.execute(&config.settings_path).await,
            Commands::Package(cmd) => cmd.execute(&config.settings_path).await,
        }
    }
}
