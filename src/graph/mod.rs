//! Bidirectional dependency graph for incremental rebuilds.
//!
//! Forward edges run from a composed file to everything it used (includes,
//! layouts, stylesheets, images, ...). Reverse edges run the other way and
//! answer the question a watcher asks: "this file changed, which pages must
//! be rebuilt?"
//!
//! Both maps are updated together inside every mutating call, so a caller
//! holding `&DependencyGraph` never sees them disagree. Empty sets are never
//! stored.
//!
//! ```rust
//! use pagesmith::graph::DependencyGraph;
//! use std::path::{Path, PathBuf};
//!
//! let mut graph = DependencyGraph::new();
//! graph.record(Path::new("/s/index.html"), [PathBuf::from("/s/_header.html")]);
//! graph.record(Path::new("/s/_header.html"), [PathBuf::from("/s/_logo.html")]);
//!
//! let affected = graph.transitive_dependents(Path::new("/s/_logo.html"), None);
//! assert_eq!(affected, vec![PathBuf::from("/s/_header.html"), PathBuf::from("/s/index.html")]);
//! ```

mod shared;

pub use shared::SharedGraph;

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::core::FileRole;
use crate::utils::relative_to_root;

/// Memo of `transitive_dependents` answers, valid for one rebuild pass.
pub type DependentsCache = HashMap<PathBuf, Vec<PathBuf>>;

/// Forward and reverse adjacency over source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    forward: HashMap<PathBuf, BTreeSet<PathBuf>>,
    reverse: HashMap<PathBuf, BTreeSet<PathBuf>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outgoing edges of `file`.
    ///
    /// Old edges are dropped first, so recording the same list twice leaves
    /// the graph unchanged. Self references are ignored.
    pub fn record(&mut self, file: &Path, dependencies: impl IntoIterator<Item = PathBuf>) {
        self.clear_forward(file);

        let deps: BTreeSet<PathBuf> =
            dependencies.into_iter().filter(|dep| dep.as_path() != file).collect();
        if deps.is_empty() {
            return;
        }

        for dep in &deps {
            self.reverse.entry(dep.clone()).or_default().insert(file.to_path_buf());
        }
        self.forward.insert(file.to_path_buf(), deps);
    }

    /// Drop every edge touching `file`, in either direction.
    pub fn remove(&mut self, file: &Path) {
        self.clear_forward(file);

        if let Some(dependents) = self.reverse.remove(file) {
            for dependent in dependents {
                if let Some(deps) = self.forward.get_mut(&dependent) {
                    deps.remove(file);
                    if deps.is_empty() {
                        self.forward.remove(&dependent);
                    }
                }
            }
        }
    }

    fn clear_forward(&mut self, file: &Path) {
        let Some(old) = self.forward.remove(file) else {
            return;
        };
        for dep in old {
            if let Some(dependents) = self.reverse.get_mut(&dep) {
                dependents.remove(file);
                if dependents.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }

    /// Files that reference `file` directly, sorted.
    #[must_use]
    pub fn direct_dependents(&self, file: &Path) -> Vec<PathBuf> {
        self.reverse.get(file).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    /// Files that `file` references directly, sorted.
    #[must_use]
    pub fn direct_dependencies(&self, file: &Path) -> Vec<PathBuf> {
        self.forward.get(file).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    /// Every file that depends on `file` directly or indirectly, sorted.
    ///
    /// Breadth-first over reverse edges with a per-call visited set, so a
    /// cycle cannot loop. `file` itself is never part of the answer. Pass a
    /// cache to share work across the files changed in one rebuild pass.
    pub fn transitive_dependents(
        &self,
        file: &Path,
        cache: Option<&mut DependentsCache>,
    ) -> Vec<PathBuf> {
        if let Some(hit) = cache.as_ref().and_then(|c| c.get(file)) {
            return hit.clone();
        }

        let mut visited: HashSet<&Path> = HashSet::from([file]);
        let mut queue: VecDeque<&Path> = VecDeque::from([file]);
        let mut found: BTreeSet<PathBuf> = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            let Some(dependents) = self.reverse.get(current) else {
                continue;
            };
            for dependent in dependents {
                if visited.insert(dependent.as_path()) {
                    found.insert(dependent.clone());
                    queue.push_back(dependent.as_path());
                }
            }
        }

        let found: Vec<PathBuf> = found.into_iter().collect();
        if let Some(cache) = cache {
            cache.insert(file.to_path_buf(), found.clone());
        }
        found
    }

    /// Whether `file` has outgoing edges.
    #[must_use]
    pub fn is_page(&self, file: &Path) -> bool {
        self.forward.contains_key(file)
    }

    /// Whether `file` has incoming edges (include, layout or asset).
    #[must_use]
    pub fn is_dependency(&self, file: &Path) -> bool {
        self.reverse.contains_key(file)
    }

    #[must_use]
    pub fn file_role(&self, file: &Path) -> FileRole {
        FileRole::from_edges(self.is_page(file), self.is_dependency(file))
    }

    /// Files with outgoing edges, sorted. Includes files that are also dependencies.
    #[must_use]
    pub fn pages(&self) -> Vec<PathBuf> {
        let mut pages: Vec<PathBuf> = self.forward.keys().cloned().collect();
        pages.sort();
        pages
    }

    /// Files with incoming edges, sorted.
    #[must_use]
    pub fn dependencies(&self) -> Vec<PathBuf> {
        let mut deps: Vec<PathBuf> = self.reverse.keys().cloned().collect();
        deps.sort();
        deps
    }

    /// Check that forward and reverse agree and that no empty set is stored.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self.forward.iter().all(|(file, deps)| {
            !deps.is_empty()
                && deps.iter().all(|dep| self.reverse.get(dep).is_some_and(|r| r.contains(file)))
        });
        let reverse_ok = self.reverse.iter().all(|(dep, dependents)| {
            !dependents.is_empty()
                && dependents
                    .iter()
                    .all(|file| self.forward.get(file).is_some_and(|f| f.contains(dep)))
        });
        forward_ok && reverse_ok
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Distinct files appearing on either side of an edge.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.forward.keys().chain(self.reverse.keys()).collect::<HashSet<_>>().len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Render the dependency tree under `file`, with paths shown relative to `root`.
    #[must_use]
    pub fn to_tree_string(&self, file: &Path, root: &Path) -> String {
        let mut result = format!("{}\n", relative_to_root(file, root));
        let mut visited = HashSet::from([file.to_path_buf()]);
        let deps = self.direct_dependencies(file);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, root, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        file: &Path,
        root: &Path,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<PathBuf>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        result.push_str(&format!("{prefix}{connector}{}\n", relative_to_root(file, root)));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(file.to_path_buf()) {
            result.push_str(&format!("{child_prefix}└── (circular reference)\n"));
            return;
        }

        let deps = self.direct_dependencies(file);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, root, result, &child_prefix, i == deps.len() - 1, visited);
        }
        visited.remove(file);
    }
}
