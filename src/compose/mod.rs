//! Page composition: includes, layouts, slots and head merging
//!
//! A page goes through four steps:
//!
//! 1. **Expand includes** - every include directive is resolved against the
//!    including file and replaced by the recursively composed target. Bodies of
//!    `<include src="X">…</include>` fill the component's slots.
//! 2. **Resolve layout** - see [`layout`] for the precedence rules.
//! 3. **Merge slots** - page content is split into [`SlotBindings`] and poured
//!    into the layout's `<slot>` placeholders.
//! 4. **Merge head** - doctype, `<html>` attributes and `<head>` contents of
//!    page and layout are combined, the head via [`merge_head`].
//!
//! Every resolved include, layout and asset becomes a dependency of the page.
//! Problems that leave a usable page behind (unsafe or missing references,
//! the include depth limit) are returned as warnings. Include or layout cycles,
//! malformed directives and unreadable files abort the page with a
//! [`ComposeError`].
//!
//! # Example
//!
//! ```rust
//! use pagesmith::compose::Composer;
//! use pagesmith::config::BuildConfig;
//! use pagesmith::utils::fs::MemoryReader;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let reader = MemoryReader::new()
//!     .with_file("/site/_header.html", "<header>Site</header>");
//! let composer = Composer::new(Arc::new(reader), Arc::new(BuildConfig::default()), "/site");
//!
//! let output = composer
//!     .compose(r#"<!--#include file="_header.html"--><p>Hi</p>"#, Path::new("/site/index.html"))
//!     .await
//!     .unwrap();
//! assert_eq!(output.content, "<header>Site</header><p>Hi</p>");
//! // `_layout.html` was looked for too, so creating it later rebuilds this page
//! let expected = [Path::new("/site/_header.html").to_path_buf(), Path::new("/site/_layout.html").to_path_buf()];
//! assert_eq!(output.dependencies, expected);
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod context;
pub mod document;
pub mod error;
pub mod head;
pub mod layout;
pub mod slots;

pub use context::CompositionContext;
pub use error::{ComposeError, FatalKind};
pub use head::{HeadFragment, merge_head};
pub use layout::{LayoutChoice, LayoutSource};
pub use slots::{SlotBindings, fill_slots, split_bindings};

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::BuildConfig;
use crate::core::{Reference, ReferenceKind, Warning, WarningKind};
use crate::extractor::{CssImportWalker, IncludeDirective, PatternExtractor, ReferenceExtractor};
use crate::graph::SharedGraph;
use crate::utils::fs::SourceReader;
use crate::utils::{check_reference, normalize_path, relative_to_root};
use document::Document;

/// Result of composing one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeOutput {
    pub content: String,
    /// Includes, layouts and assets in discovery order, without duplicates
    pub dependencies: Vec<PathBuf>,
    /// The asset subset of `dependencies`, sorted
    pub assets: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Composition engine bound to one source root.
///
/// Cheap to clone; all state is behind `Arc`s. Per-page state lives in a
/// [`CompositionContext`] created by each [`compose`](Self::compose) call.
pub struct Composer<R: SourceReader> {
    reader: Arc<R>,
    extractor: Arc<dyn ReferenceExtractor>,
    config: Arc<BuildConfig>,
    root: PathBuf,
}

impl<R: SourceReader> Clone for Composer<R> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            extractor: Arc::clone(&self.extractor),
            config: Arc::clone(&self.config),
            root: self.root.clone(),
        }
    }
}

impl<R: SourceReader> Composer<R> {
    pub fn new(reader: Arc<R>, config: Arc<BuildConfig>, root: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            extractor: Arc::new(PatternExtractor),
            config,
            root: normalize_path(&root.into()),
        }
    }

    /// Swap the reference extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ReferenceExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Compose `content`, the source of the page at `path`.
    ///
    /// Pure with respect to the dependency graph; see
    /// [`compose_and_commit`](Self::compose_and_commit) to record the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ComposeError`] for include or layout cycles, malformed
    /// layout directives and files that exist but cannot be read.
    pub async fn compose(&self, content: &str, path: &Path) -> Result<ComposeOutput, ComposeError> {
        let path = normalize_path(path);
        debug!("Composing {}", relative_to_root(&path, &self.root));

        let mut ctx = CompositionContext::new(&path);
        let expanded = self.expand_includes(content, &path, &mut ctx, 0).await?;
        let (layout, page) = self.choose_page_layout(&expanded, &path, &mut ctx).await?;
        let composed = match layout {
            Some(layout) => self.apply_layout(page, layout, &mut ctx).await?,
            None => page,
        };

        Ok(ctx.into_output(composed))
    }

    /// Compose a page and commit its dependencies with a single graph update.
    ///
    /// A failed page commits nothing, leaving its previous edges in place.
    ///
    /// # Errors
    ///
    /// Same as [`compose`](Self::compose).
    pub async fn compose_and_commit(
        &self,
        content: &str,
        path: &Path,
        graph: &SharedGraph,
    ) -> Result<ComposeOutput, ComposeError> {
        let output = self.compose(content, path).await?;
        graph.commit(&normalize_path(path), output.dependencies.iter().cloned()).await;
        Ok(output)
    }

    fn expand_includes<'a>(
        &'a self,
        content: &'a str,
        file: &'a Path,
        ctx: &'a mut CompositionContext,
        depth: usize,
    ) -> BoxFuture<'a, Result<String, ComposeError>> {
        async move {
            let directives = self.extractor.includes(content);

            let mut outside = String::with_capacity(content.len());
            let mut last = 0;
            for directive in &directives {
                outside.push_str(&content[last..directive.span.start]);
                last = directive.span.end;
            }
            outside.push_str(&content[last..]);
            self.collect_assets(&outside, file, ctx).await;

            if directives.is_empty() {
                return Ok(content.to_string());
            }

            let mut out = String::with_capacity(content.len());
            let mut last = 0;
            for directive in &directives {
                out.push_str(&content[last..directive.span.start]);
                out.push_str(&self.expand_directive(directive, file, ctx, depth).await?);
                last = directive.span.end;
            }
            out.push_str(&content[last..]);
            Ok(out)
        }
        .boxed()
    }

    async fn expand_directive(
        &self,
        directive: &IncludeDirective,
        file: &Path,
        ctx: &mut CompositionContext,
        depth: usize,
    ) -> Result<String, ComposeError> {
        let src = directive.src.trim();

        if depth >= self.config.max_include_depth {
            ctx.warn(Warning::new(
                WarningKind::DepthExceeded,
                file,
                src,
                format!("include depth limit ({}) reached", self.config.max_include_depth),
            ));
            return Ok(format!("<!-- WARNING: include depth limit reached: {src} -->"));
        }

        let Some(target) = self.resolve_include(src, file, ctx).await else {
            return Ok(not_found_marker(src));
        };

        if ctx.is_composing(&target) {
            return Err(ComposeError::CircularDependency {
                chain: ctx.chain().to_vec(),
                target,
            });
        }

        let source = match self.reader.read_to_string(&target).await {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                ctx.add_dependency(&target);
                ctx.warn(Warning::new(WarningKind::MissingReference, file, src, "include vanished while reading"));
                return Ok(not_found_marker(src));
            }
            Err(source) => {
                return Err(ComposeError::Read {
                    path: target,
                    source,
                });
            }
        };
        ctx.add_dependency(&target);

        // The body is written in the including file, at the including depth
        let bindings = match &directive.body {
            Some(body) => Some(split_bindings(&self.expand_includes(body, file, ctx, depth).await?)),
            None => None,
        };

        ctx.enter(&target);
        let expanded = self.expand_includes(&source, &target, ctx, depth + 1).await?;
        ctx.leave();

        Ok(match bindings {
            Some(bindings) => fill_slots(&expanded, &bindings),
            None => expanded,
        })
    }

    /// Resolve an include target, falling back to the includes directory.
    async fn resolve_include(
        &self,
        src: &str,
        file: &Path,
        ctx: &mut CompositionContext,
    ) -> Option<PathBuf> {
        let path = match check_reference(src, file, &self.root) {
            Ok(path) => path,
            Err(rejection) => {
                let kind = if rejection.is_security_violation() {
                    WarningKind::SecurityViolation
                } else {
                    WarningKind::MissingReference
                };
                ctx.warn(Warning::new(kind, file, src, format!("include rejected: {rejection}")));
                return None;
            }
        };
        if self.reader.exists(&path).await {
            return Some(path);
        }
        // Recorded even when missing, so that creating the file later triggers a rebuild
        ctx.add_dependency(&path);

        let relative = src.trim_start_matches("./").trim_start_matches('/');
        let fallback = format!("/{}/{relative}", self.config.includes_dir.trim_matches('/'));
        if let Ok(alt) = check_reference(&fallback, file, &self.root) {
            if alt != path {
                ctx.add_dependency(&alt);
                if self.reader.exists(&alt).await {
                    debug!("Include '{}' found in includes directory: {}", src, alt.display());
                    return Some(alt);
                }
            }
        }

        ctx.warn(Warning::new(WarningKind::MissingReference, file, src, format!("include not found: {src}")));
        None
    }

    /// Wrap `content` in `layout`, then in the layout's own layout, if any.
    fn apply_layout<'a>(
        &'a self,
        content: String,
        layout: PathBuf,
        ctx: &'a mut CompositionContext,
    ) -> BoxFuture<'a, Result<String, ComposeError>> {
        async move {
            if ctx.is_composing(&layout) {
                return Err(ComposeError::CircularDependency {
                    chain: ctx.chain().to_vec(),
                    target: layout,
                });
            }

            let source = match self.reader.read_to_string(&layout).await {
                Ok(source) => source,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    let label = relative_to_root(&layout, &self.root);
                    ctx.warn(Warning::new(
                        WarningKind::MissingReference,
                        &layout,
                        label.clone(),
                        format!("layout not found: {label}"),
                    ));
                    return Ok(content);
                }
                Err(source) => {
                    return Err(ComposeError::Read {
                        path: layout,
                        source,
                    });
                }
            };

            ctx.enter(&layout);
            let expanded = self.expand_includes(&source, &layout, ctx, 0).await?;
            let directives = self.extractor.layout_directives(&expanded);
            let (outer, layout_body) = layout::take_explicit_layout(&expanded, &layout, &directives)?;

            let merged = merge_into_layout(
                &content,
                &layout_body,
                &relative_to_root(&layout, &self.root),
            );

            let result = match outer {
                Some(choice) => match self.find_layout(&choice, &layout, ctx).await {
                    Some(outer) => self.apply_layout(merged, outer, ctx).await?,
                    None => merged,
                },
                None => merged,
            };
            ctx.leave();
            Ok(result)
        }
        .boxed()
    }

    /// Record asset references of `html`, following stylesheet imports.
    async fn collect_assets(&self, html: &str, file: &Path, ctx: &mut CompositionContext) {
        for reference in self.extractor.from_html(html, file, &self.root) {
            let Some(stylesheet) = self.track_asset(&reference, ctx).await else {
                continue;
            };

            let walker = CssImportWalker::new(
                self.extractor.as_ref(),
                self.reader.as_ref(),
                &self.root,
                self.config.max_css_import_depth,
            );
            let mut visited = HashSet::from([stylesheet.clone()]);
            for imported in walker.follow(&stylesheet, &mut visited, 0).await {
                self.track_asset(&imported, ctx).await;
            }
        }
    }

    /// Record one asset reference. Returns the path when it is a stylesheet
    /// seen for the first time on disk, so its imports can be followed.
    async fn track_asset(&self, reference: &Reference, ctx: &mut CompositionContext) -> Option<PathBuf> {
        let Some(to) = &reference.to else {
            ctx.warn(Warning::new(
                WarningKind::SecurityViolation,
                &reference.from,
                reference.raw.as_str(),
                format!("unsafe {} reference skipped", reference.kind),
            ));
            return None;
        };

        if !ctx.add_asset(to) {
            return None;
        }
        if !self.reader.exists(to).await {
            ctx.warn(Warning::new(
                WarningKind::MissingReference,
                &reference.from,
                reference.raw.as_str(),
                format!("referenced file not found: {}", relative_to_root(to, &self.root)),
            ));
            return None;
        }
        (reference.kind == ReferenceKind::Stylesheet).then(|| to.clone())
    }
}

fn not_found_marker(src: &str) -> String {
    format!("<!-- WARNING: include not found: {src} -->")
}

/// Pour `page` into `layout`: slots first, then head, doctype and `<html>` attributes.
fn merge_into_layout(page: &str, layout: &str, layout_label: &str) -> String {
    let page_doc = Document::parse(page);
    let mut out = fill_slots(layout, &split_bindings(&page_doc.body));

    if page_doc.is_full || page_doc.head.is_some() {
        let layout_head = Document::parse(&out).head.unwrap_or_default();
        let merged = merge_head(&[
            HeadFragment::new(layout_label, layout_head),
            HeadFragment::new("page", page_doc.head.unwrap_or_default()),
        ]);
        out = document::replace_head(&out, &merged);
    }

    if page_doc.is_full {
        if let Some(doctype) = &page_doc.doctype {
            out = document::replace_doctype(&out, doctype);
        }
        if let Some(page_attrs) = &page_doc.html_attrs {
            let layout_attrs = Document::parse(&out).html_attrs.unwrap_or_default();
            out = document::replace_html_attributes(
                &out,
                &document::union_attributes(&layout_attrs, page_attrs),
            );
        }
    }
    out
}

/// Compose one page and commit its dependencies to `graph`.
///
/// Convenience entry point for orchestrators that do not keep a [`Composer`].
///
/// # Errors
///
/// Same as [`Composer::compose`].
pub async fn compose_page<R: SourceReader>(
    content: &str,
    path: &Path,
    root: &Path,
    graph: &SharedGraph,
    config: Arc<BuildConfig>,
    reader: Arc<R>,
) -> Result<ComposeOutput, ComposeError> {
    Composer::new(reader, config, root).compose_and_commit(content, path, graph).await
}
