//! Constants used across the pagesmith codebase.
//!
//! Limits and well-known names live here so that the config defaults, the
//! compositor and the CLI agree on them.

/// Name of the project configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "pagesmith.toml";

/// Default source directory, relative to the project root.
pub const DEFAULT_SOURCE_DIR: &str = "src";

/// Default output directory, relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Directory searched when an include is not found next to the including file.
pub const DEFAULT_INCLUDES_DIR: &str = "_includes";

/// Directory searched for layouts referenced by short name.
pub const DEFAULT_LAYOUTS_DIR: &str = "_layouts";

/// Implicit layout picked up from the page directory or any ancestor.
pub const IMPLICIT_LAYOUT_FILE: &str = "_layout.html";

/// Suffix of layout files addressed by short name (`blog` → `_blog.layout.html`).
pub const LAYOUT_SUFFIX: &str = ".layout.html";

/// Include nesting limit. Content at this depth is still expanded; directives
/// inside it are not.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 10;

/// `@import` nesting limit for stylesheets.
pub const DEFAULT_MAX_CSS_IMPORT_DEPTH: usize = 10;

