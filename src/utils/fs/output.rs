//! Output tree writes for the build command.
//!
//! The composition engine never writes. These helpers are used by the CLI
//! after a build pass to materialize composed pages and copy referenced assets.

use anyhow::{Context, Result};
use std::path::Path;

/// Writes `content` to `path` atomically.
///
/// The parent directory is created if needed, the bytes go to a sibling temp
/// file first, and the temp file is renamed over the destination so a reader
/// never observes a half-written page.
pub async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Copies one file, creating the destination directory first.
pub async fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::copy(src, dst)
        .await
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}
