//! Page → asset index used by the asset-copy stage.

use dashmap::DashMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Which pages reference which assets.
///
/// Each page's entry is replaced whole when the page is committed, mirroring
/// [`DependencyGraph::record`](crate::graph::DependencyGraph::record). Reads
/// may run concurrently with commits of other pages.
#[derive(Debug, Default)]
pub struct AssetIndex {
    by_page: DashMap<PathBuf, BTreeSet<PathBuf>>,
}

impl AssetIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the asset set of `page`. An empty set removes the entry.
    pub fn replace(&self, page: &Path, assets: impl IntoIterator<Item = PathBuf>) {
        let assets: BTreeSet<PathBuf> = assets.into_iter().collect();
        if assets.is_empty() {
            self.by_page.remove(page);
        } else {
            self.by_page.insert(page.to_path_buf(), assets);
        }
    }

    /// Forget everything about `file`, as a page and as an asset.
    pub fn remove(&self, file: &Path) {
        self.by_page.remove(file);
        self.by_page.retain(|_, assets| {
            assets.remove(file);
            !assets.is_empty()
        });
    }

    /// Union of every page's assets.
    #[must_use]
    pub fn all_referenced_assets(&self) -> BTreeSet<PathBuf> {
        self.by_page.iter().flat_map(|entry| entry.value().clone()).collect()
    }

    #[must_use]
    pub fn is_asset_referenced(&self, asset: &Path) -> bool {
        self.by_page.iter().any(|entry| entry.value().contains(asset))
    }

    /// Pages whose committed asset set contains `asset`, sorted.
    #[must_use]
    pub fn pages_that_reference(&self, asset: &Path) -> Vec<PathBuf> {
        let mut pages: Vec<PathBuf> = self
            .by_page
            .iter()
            .filter(|entry| entry.value().contains(asset))
            .map(|entry| entry.key().clone())
            .collect();
        pages.sort();
        pages
    }

    /// Number of pages with at least one asset.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.by_page.len()
    }
}
