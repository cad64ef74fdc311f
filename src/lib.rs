//! pagesmith - static site composition with incremental rebuilds
//!
//! pagesmith turns a tree of HTML sources into a deployable site. Pages pull
//! in shared fragments with include directives, wrap themselves in layouts,
//! and fill the layout's slots. Every file a page touches is recorded in a
//! dependency graph, so an edit to one header or stylesheet rebuilds exactly
//! the pages that use it.
//!
//! # Architecture Overview
//!
//! Leaves first:
//!
//! - [`utils::path_validation`] - turns a reference as written into a safe,
//!   in-root absolute path, or rejects it
//! - [`extractor`] - pattern-based scanning of HTML and CSS for asset
//!   references and composition directives
//! - [`graph`] - forward and reverse dependency edges with transitive queries
//! - [`compose`] - include expansion, layout resolution, slot filling and
//!   `<head>` merging for one page
//! - [`build`] - page discovery, parallel composition, graph commits and
//!   incremental rebuild planning
//!
//! Supporting modules:
//!
//! - [`config`] - `pagesmith.toml`
//! - [`core`] - shared types, errors and warnings
//! - [`cli`] - the `pagesmith` command
//!
//! # Directive Syntax
//!
//! ```html
//! <!--#include file="_header.html"-->
//! <!--#include virtual="/_includes/nav.html"-->
//! <include src="_card.html"/>
//! <include src="_card.html"><h2 data-slot="title">Hi</h2><p>body</p></include>
//!
//! <link rel="layout" href="blog">         <!-- full documents -->
//! <article data-layout="blog">…</article> <!-- fragments -->
//!
//! <slot></slot> <slot name="sidebar">fallback</slot>
//! <template target="sidebar">…</template>
//! ```
//!
//! # Configuration (pagesmith.toml)
//!
//! ```toml
//! source = "src"
//! output = "dist"
//! max_include_depth = 10
//!
//! [[default_layouts]]
//! pattern = "blog/**"
//! layout = "post"
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use pagesmith::build::{SiteBuilder, write_site};
//! use pagesmith::config::BuildConfig;
//! use pagesmith::utils::fs::DiskReader;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = BuildConfig::load_or_default(Path::new(".")).await?;
//! let builder = SiteBuilder::new(Arc::new(DiskReader), Arc::new(config), "src");
//! let report = builder.build().await?;
//! write_site(&report, builder.assets(), builder.root(), Path::new("dist")).await?;
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cli;
pub mod compose;
pub mod config;
pub mod constants;
pub mod core;
pub mod extractor;
pub mod graph;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
