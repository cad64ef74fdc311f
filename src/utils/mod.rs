//! Utilities shared by the extractor, compositor and build orchestration
//!
//! # Modules
//!
//! - [`fs`] - lexical path helpers, the async [`SourceReader`](fs::SourceReader) seam, output writes
//! - [`path_validation`] - the reference resolver that guards every file access
//! - [`security`] - deny-lists consulted by the resolver
//!
//! # Example
//!
//! ```rust
//! use pagesmith::utils::resolve_reference;
//! use std::path::Path;
//!
//! let resolved = resolve_reference("/css/site.css", Path::new("/site/blog/post.html"), Path::new("/site"));
//! assert_eq!(resolved.as_deref(), Some(Path::new("/site/css/site.css")));
//! ```

pub mod fs;
pub mod path_validation;
pub mod security;

pub use fs::{is_within_root, normalize_path, relative_to_root};
pub use path_validation::{PathRejection, check_reference, is_external_reference, resolve_reference};
