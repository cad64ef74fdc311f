use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use super::ComposeOutput;
use crate::core::Warning;

/// Mutable state for one top-level composition call.
///
/// Created per page and dropped when the page is done; nothing in here is
/// shared with another page, so concurrent pages cannot see each other's
/// cycle guard.
#[derive(Debug)]
pub struct CompositionContext {
    /// Files currently being composed, outermost first
    chain: Vec<PathBuf>,
    dependencies: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
    assets: BTreeSet<PathBuf>,
    warnings: Vec<Warning>,
}

impl CompositionContext {
    pub fn new(page: &Path) -> Self {
        Self {
            chain: vec![page.to_path_buf()],
            dependencies: Vec::new(),
            seen: HashSet::from([page.to_path_buf()]),
            assets: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_composing(&self, file: &Path) -> bool {
        self.chain.iter().any(|f| f == file)
    }

    pub fn chain(&self) -> &[PathBuf] {
        &self.chain
    }

    pub fn enter(&mut self, file: &Path) {
        self.chain.push(file.to_path_buf());
    }

    pub fn leave(&mut self) {
        self.chain.pop();
    }

    /// Record a dependency edge from the page. The page itself is never a dependency.
    pub fn add_dependency(&mut self, file: &Path) {
        if self.seen.insert(file.to_path_buf()) {
            self.dependencies.push(file.to_path_buf());
        }
    }

    /// Record an asset; assets are dependencies too. Returns `false` when the
    /// asset was already recorded.
    pub fn add_asset(&mut self, file: &Path) -> bool {
        self.add_dependency(file);
        self.assets.insert(file.to_path_buf())
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn into_output(self, content: String) -> ComposeOutput {
        ComposeOutput {
            content,
            dependencies: self.dependencies,
            assets: self.assets.into_iter().collect(),
            warnings: self.warnings,
        }
    }
}
