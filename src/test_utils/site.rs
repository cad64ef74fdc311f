//! On-disk test site.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::build::SiteBuilder;
use crate::config::BuildConfig;
use crate::constants::CONFIG_FILE_NAME;
use crate::utils::fs::DiskReader;

/// A temporary project: `<tmp>/src` for sources, `<tmp>/dist` for output.
///
/// Everything is removed when the value is dropped.
pub struct TestSite {
    pub temp_dir: TempDir,
    pub project_dir: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestSite {
    /// Create an empty site.
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().to_path_buf();
        let source_dir = project_dir.join("src");
        let output_dir = project_dir.join("dist");
        std::fs::create_dir_all(&source_dir)?;

        Ok(Self {
            temp_dir,
            project_dir,
            source_dir,
            output_dir,
        })
    }

    /// Absolute path of a source file.
    #[must_use]
    pub fn source(&self, relative: &str) -> PathBuf {
        self.source_dir.join(relative)
    }

    /// Write a source file, creating parent directories.
    pub async fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.source(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Delete a source file.
    pub async fn delete(&self, relative: &str) -> Result<PathBuf> {
        let path = self.source(relative);
        tokio::fs::remove_file(&path).await?;
        Ok(path)
    }

    /// Write `pagesmith.toml` in the project directory.
    pub async fn write_config(&self, toml: &str) -> Result<()> {
        tokio::fs::write(self.project_dir.join(CONFIG_FILE_NAME), toml).await?;
        Ok(())
    }

    /// Read a file from the output directory.
    pub async fn read_output(&self, relative: &str) -> Result<String> {
        let path = self.output_dir.join(relative);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read output {}", path.display()))
    }

    /// A disk-backed builder over this site with `config`.
    #[must_use]
    pub fn builder(&self, config: BuildConfig) -> SiteBuilder<DiskReader> {
        SiteBuilder::new(Arc::new(DiskReader), Arc::new(config), &self.source_dir)
    }

    pub fn path(&self) -> &Path {
        &self.project_dir
    }
}
