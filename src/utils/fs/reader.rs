//! Async source readers.
//!
//! Composition never writes; it only reads pages, includes, layouts and
//! stylesheets. [`SourceReader`] is the seam between the engine and storage:
//! [`DiskReader`] reads the real tree through tokio, [`MemoryReader`] serves an
//! in-memory site for tests and for editors that hold unsaved buffers.

use dashmap::DashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only access to source files.
///
/// Reads are the only suspension points of a composition, so implementations
/// must be cheap to share across concurrently composing pages.
pub trait SourceReader: Send + Sync {
    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;

    /// Whether `path` names an existing file.
    fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;
}

/// Reader backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskReader;

impl SourceReader for DiskReader {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
    }
}

/// Reader backed by an in-memory map of path → content.
#[derive(Debug, Default)]
pub struct MemoryReader {
    files: DashMap<PathBuf, String>,
}

impl MemoryReader {
    /// Create an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Delete a file, returning its previous content.
    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.remove(path).map(|(_, content)| content)
    }

    /// All stored paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

impl SourceReader for MemoryReader {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).map(|entry| entry.value().clone()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}
