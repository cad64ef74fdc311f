//! Command-line interface for pagesmith.
//!
//! A thin front end over [`crate::build`]. Each subcommand lives in its own
//! module and exposes an `execute` method taking the resolved [`Project`].
//!
//! # Commands
//!
//! - `build` - compose every page and write the output tree
//! - `compose` - print one composed page to stdout
//! - `deps` - show which pages depend on a file
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - errors only
//! - `--root` - project directory (default: current directory)
//! - `--config` - explicit path to `pagesmith.toml`
//!
//! `RUST_LOG` overrides the level chosen by the flags.

mod build;
pub mod common;
mod compose;
mod deps;

pub use build::FailLevel;
pub use common::Project;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` keeps the subscriber at `error`
    pub log_level: Option<String>,

    /// Explicit config file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber. `RUST_LOG` wins over the flags.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("pagesmith={}", self.log_level.as_deref().unwrap_or("error")))
        });

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "pagesmith",
    about = "Static site builder with includes, layouts and incremental rebuilds",
    version,
    long_about = "pagesmith composes HTML pages from includes, layouts and slots, and tracks \
                  which pages depend on which files so edits rebuild only what changed."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Project directory containing pagesmith.toml
    #[arg(long, global = true, env = "PAGESMITH_ROOT")]
    root: Option<PathBuf>,

    /// Path to a config file, overriding <root>/pagesmith.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose all pages and write the output directory
    Build(build::BuildCommand),

    /// Print a single composed page
    Compose(compose::ComposeCommand),

    /// Show the pages that depend on a file
    Deps(deps::DepsCommand),
}

impl Cli {
    /// Execute with configuration derived from the global flags.
    ///
    /// # Errors
    ///
    /// Returns whatever the subcommand returns.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration, for tests and embedding.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be loaded or the subcommand fails.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let project = Project::load(self.root, config.config_path).await?;
        match self.command {
            Commands::Build(cmd) => cmd.execute(&project).await,
            Commands::Compose(cmd) => cmd.execute(&project).await,
            Commands::Deps(cmd) => cmd.execute(&project).await,
        }
    }
}
