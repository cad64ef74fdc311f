//! File system utilities
//!
//! - [`paths`] - lexical normalization and root containment, no I/O
//! - [`reader`] - the async [`SourceReader`] seam used by composition
//! - [`output`] - atomic writes and copies for the build output tree
//!
//! # Examples
//!
//! ```rust
//! use pagesmith::utils::fs::{is_within_root, normalize_path};
//! use std::path::Path;
//!
//! let resolved = normalize_path(Path::new("/site/src/blog/../css/main.css"));
//! assert!(is_within_root(&resolved, Path::new("/site/src")));
//! ```

pub mod output;
pub mod paths;
pub mod reader;

pub use output::{atomic_write, copy_file};
pub use paths::{is_within_root, normalize_path, relative_to_root};
pub use reader::{DiskReader, MemoryReader, SourceReader};
