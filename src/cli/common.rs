//! Shared plumbing for CLI commands.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::build::SiteBuilder;
use crate::config::BuildConfig;
use crate::core::PagesmithError;
use crate::utils::fs::DiskReader;
use crate::utils::normalize_path;

/// A loaded project: its directory, configuration and derived roots.
#[derive(Debug, Clone)]
pub struct Project {
    pub project_dir: PathBuf,
    pub config: Arc<BuildConfig>,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
}

impl Project {
    /// Load the project rooted at `root` (default: the current directory).
    ///
    /// `config_path` overrides `<root>/pagesmith.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails to load or the source directory
    /// does not exist.
    pub async fn load(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let project_dir = match root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let project_dir = normalize_path(&absolute(&project_dir)?);

        let config = match config_path {
            Some(path) => BuildConfig::load_from(&path).await?,
            None => BuildConfig::load_or_default(&project_dir).await?,
        };

        let source_root = normalize_path(&config.source_root(&project_dir));
        if !source_root.is_dir() {
            return Err(PagesmithError::SourceRootMissing {
                path: source_root,
            }
            .into());
        }
        let output_root = normalize_path(&config.output_root(&project_dir));

        Ok(Self {
            project_dir,
            config: Arc::new(config),
            source_root,
            output_root,
        })
    }

    /// A disk-backed builder for this project.
    #[must_use]
    pub fn builder(&self) -> SiteBuilder<DiskReader> {
        SiteBuilder::new(Arc::new(DiskReader), Arc::clone(&self.config), &self.source_root)
    }

    /// Resolve a file argument: absolute paths as given, relative ones against
    /// the current directory if they exist there, else against the source root.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn resolve_file(&self, arg: &Path) -> Result<PathBuf> {
        if arg.is_absolute() {
            return Ok(normalize_path(arg));
        }
        let from_cwd = absolute(arg)?;
        if from_cwd.exists() {
            return Ok(normalize_path(&from_cwd));
        }
        Ok(normalize_path(&self.source_root.join(arg)))
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir().context("Failed to determine current directory")?.join(path))
    }
}
