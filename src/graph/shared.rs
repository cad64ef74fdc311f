use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

use super::{DependencyGraph, DependentsCache};

/// The build-wide graph behind a single writer lock.
///
/// Pages compose in parallel against their own state and then commit with one
/// [`commit`](Self::commit) call each. Commits are serialized by the lock;
/// queries take a read guard and may overlap each other.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<DependencyGraph>>,
}

impl SharedGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the outgoing edges of `file`.
    pub async fn commit(&self, file: &Path, dependencies: impl IntoIterator<Item = PathBuf>) {
        let mut graph = self.inner.write().await;
        graph.record(file, dependencies);
        debug!(
            "Committed {} ({} dependencies)",
            file.display(),
            graph.direct_dependencies(file).len()
        );
    }

    /// Drop every edge touching `file`.
    pub async fn remove(&self, file: &Path) {
        self.inner.write().await.remove(file);
    }

    pub async fn transitive_dependents(
        &self,
        file: &Path,
        cache: Option<&mut DependentsCache>,
    ) -> Vec<PathBuf> {
        self.inner.read().await.transitive_dependents(file, cache)
    }

    pub async fn direct_dependencies(&self, file: &Path) -> Vec<PathBuf> {
        self.inner.read().await.direct_dependencies(file)
    }

    /// Read guard for several queries against one consistent state.
    pub async fn read(&self) -> RwLockReadGuard<'_, DependencyGraph> {
        self.inner.read().await
    }

    /// Owned copy of the current state.
    pub async fn snapshot(&self) -> DependencyGraph {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_commits_stay_consistent() {
        let graph = SharedGraph::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let graph = graph.clone();
            handles.push(tokio::spawn(async move {
                let page = PathBuf::from(format!("/s/page{i}.html"));
                graph
                    .commit(&page, [PathBuf::from("/s/_layout.html"), PathBuf::from(format!("/s/{i}.css"))])
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = graph.snapshot().await;
        assert!(snapshot.is_consistent());
        assert_eq!(snapshot.pages().len(), 32);
        assert_eq!(graph.transitive_dependents(Path::new("/s/_layout.html"), None).await.len(), 32);
    }
}
