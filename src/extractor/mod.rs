//! Reference extraction from HTML and CSS sources
//!
//! Extraction is pattern based. It recognises the tags, attributes and CSS
//! rules that carry file references without building a DOM, and hands every
//! candidate path to [`resolve_reference`](crate::utils::resolve_reference).
//!
//! The compositor only talks to the [`ReferenceExtractor`] trait, so a real
//! HTML parser can replace [`PatternExtractor`] without touching the graph or
//! the composition engine.
//!
//! # Modules
//!
//! - [`html`] - asset tags, icon links, inline styles and `<style>` blocks
//! - [`css`] - `url()`, `@font-face`, `@import` and import following
//! - [`directives`] - include, `<link rel="layout">` and `data-layout` directives
//! - [`markup`] - attribute parsing and balanced tag matching
//! - [`assets`] - the page → asset index consulted by the copy stage
//!
//! # Example
//!
//! ```rust
//! use pagesmith::core::ReferenceKind;
//! use pagesmith::extractor::{PatternExtractor, ReferenceExtractor};
//! use std::path::Path;
//!
//! let refs = PatternExtractor.from_html(
//!     r#"<link rel="stylesheet" href="css/site.css"><img src="logo.png">"#,
//!     Path::new("/site/index.html"),
//!     Path::new("/site"),
//! );
//! assert_eq!(refs.len(), 2);
//! assert_eq!(refs[0].kind, ReferenceKind::Stylesheet);
//! ```

pub mod assets;
pub mod css;
pub mod directives;
pub mod html;
pub mod markup;

use std::path::Path;

use crate::core::Reference;

pub use assets::AssetIndex;
pub use css::CssImportWalker;
pub use directives::{
    DataLayout, IncludeDirective, IncludeSyntax, LayoutDirectives, LayoutLink,
};

/// Source-text scanners used by the compositor.
///
/// Implementations never fail: unsafe references come back with `to: None`
/// and unknown syntax is simply not matched.
pub trait ReferenceExtractor: Send + Sync {
    /// Asset references in an HTML document or fragment.
    fn from_html(&self, html: &str, path: &Path, root: &Path) -> Vec<Reference>;

    /// Asset and `@import` references in a stylesheet.
    fn from_css(&self, css: &str, path: &Path, root: &Path) -> Vec<Reference>;

    /// Top-level include directives, in document order.
    fn includes(&self, html: &str) -> Vec<IncludeDirective>;

    /// Layout link and `data-layout` attributes.
    fn layout_directives(&self, html: &str) -> LayoutDirectives;
}

/// The regex-based extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl ReferenceExtractor for PatternExtractor {
    fn from_html(&self, html: &str, path: &Path, root: &Path) -> Vec<Reference> {
        html::extract(html, path, root)
    }

    fn from_css(&self, css: &str, path: &Path, root: &Path) -> Vec<Reference> {
        css::extract(css, path, root)
    }

    fn includes(&self, html: &str) -> Vec<IncludeDirective> {
        directives::find_includes(html)
    }

    fn layout_directives(&self, html: &str) -> LayoutDirectives {
        directives::find_layout_directives(html)
    }
}
