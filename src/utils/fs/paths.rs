//! Lexical path utilities.
//!
//! Nothing here touches the filesystem. The resolver relies on that: a reference
//! is classified as safe or unsafe from its text alone.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components.
///
/// This function cleans up path components by:
/// - Removing `.` (current directory) components
/// - Resolving `..` (parent directory) components
/// - Maintaining the path's absolute or relative nature
///
/// A `..` that would climb above the root of an absolute path removes the root
/// itself, so the result stops being absolute and can never pass a containment
/// check against an absolute source root.
///
/// # Examples
///
/// ```rust
/// use pagesmith::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// let path = Path::new("/site/./blog/../index.html");
/// assert_eq!(normalize_path(path), PathBuf::from("/site/index.html"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {} // Skip .
            Component::ParentDir => {
                components.pop(); // Remove previous component for ..
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Whether `path` is `root` itself or lies beneath it.
///
/// Both paths are compared component-wise after normalization, so `/src2/a`
/// is not inside `/src`.
#[must_use]
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    let path = normalize_path(path);
    let root = normalize_path(root);
    path == root || path.starts_with(&root)
}

/// Root-relative form of `path` using `/` separators, for glob matching and display.
///
/// Falls back to the full path when `path` is outside `root`.
#[must_use]
pub fn relative_to_root(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
