//! Layout selection and lookup.
//!
//! Precedence for a page, highest first:
//!
//! 1. `<link rel="layout" href="X">` (full documents only)
//! 2. `data-layout="X"` (a fragment may carry exactly one)
//! 3. the first matching `default_layouts` rule (fragments only)
//! 4. the nearest `_layout.html` from the page directory up to the root (fragments only)
//!
//! A full document without a link falls back to its first `data-layout`.
//! Layouts themselves only honour 1 and 2, which is how nested layouts work.
//!
//! `X` is either a short name or a path. A short name `blog` is looked up as
//! `_blog.layout.html` from the referencing directory up to the root, then as
//! `<layouts_dir>/blog.html` and `<layouts_dir>/_blog.layout.html`.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::document::is_full_document;
use super::{ComposeError, Composer, CompositionContext};
use crate::constants::{IMPLICIT_LAYOUT_FILE, LAYOUT_SUFFIX};
use crate::core::{Warning, WarningKind};
use crate::extractor::LayoutDirectives;
use crate::utils::fs::SourceReader;
use crate::utils::{check_reference, is_within_root, relative_to_root};

/// Where a layout choice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    Link,
    DataLayout,
    DefaultRule,
    Implicit,
}

/// A layout reference as written, before lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutChoice {
    pub value: String,
    pub source: LayoutSource,
}

/// Pick the explicit layout directive of `content` and strip it.
///
/// Returns the content unchanged when there is no directive.
///
/// # Errors
///
/// [`ComposeError::MalformedDirective`] for a fragment with more than one
/// `data-layout` attribute.
pub fn take_explicit_layout(
    content: &str,
    path: &Path,
    directives: &LayoutDirectives,
) -> Result<(Option<LayoutChoice>, String), ComposeError> {
    let strip = |span: &std::ops::Range<usize>| format!("{}{}", &content[..span.start], &content[span.end..]);

    if is_full_document(content) {
        if let Some(link) = &directives.link {
            let choice = LayoutChoice {
                value: link.href.clone(),
                source: LayoutSource::Link,
            };
            return Ok((Some(choice), strip(&link.span)));
        }
    } else if directives.data_layouts.len() > 1 {
        return Err(ComposeError::MalformedDirective {
            path: path.to_path_buf(),
            message: format!(
                "a fragment may carry one data-layout attribute, found {}",
                directives.data_layouts.len()
            ),
        });
    }

    match directives.data_layouts.first() {
        Some(attr) => {
            let choice = LayoutChoice {
                value: attr.value.clone(),
                source: LayoutSource::DataLayout,
            };
            Ok((Some(choice), strip(&attr.span)))
        }
        None => Ok((None, content.to_string())),
    }
}

fn is_short_name(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl<R: SourceReader> Composer<R> {
    /// Layout for a page: explicit directive first, then the implicit rules for fragments.
    pub(super) async fn choose_page_layout(
        &self,
        content: &str,
        path: &Path,
        ctx: &mut CompositionContext,
    ) -> Result<(Option<PathBuf>, String), ComposeError> {
        let directives = self.extractor.layout_directives(content);
        let (explicit, stripped) = take_explicit_layout(content, path, &directives)?;

        if let Some(choice) = explicit {
            let layout = self.find_layout(&choice, path, ctx).await;
            return Ok((layout, stripped));
        }
        if is_full_document(content) {
            return Ok((None, stripped));
        }

        let rel = relative_to_root(path, &self.root);
        if let Some(value) = self.config.default_layout_for(&rel) {
            let choice = LayoutChoice {
                value: value.to_string(),
                source: LayoutSource::DefaultRule,
            };
            let layout = self.find_layout(&choice, path, ctx).await;
            return Ok((layout, stripped));
        }

        let implicit = self.implicit_layout(path, ctx).await;
        if let Some(layout) = &implicit {
            debug!("Using implicit layout {} for {}", layout.display(), path.display());
        }
        Ok((implicit, stripped))
    }

    /// Look a layout up by short name or path. A miss is a warning.
    ///
    /// Every candidate checked is recorded, found or not, so that creating a
    /// nearer layout later triggers a rebuild.
    pub(super) async fn find_layout(
        &self,
        choice: &LayoutChoice,
        from: &Path,
        ctx: &mut CompositionContext,
    ) -> Option<PathBuf> {
        let value = choice.value.trim();
        let candidates = if is_short_name(value) {
            self.short_name_candidates(value, from)
        } else {
            let mut candidates = Vec::new();
            match check_reference(value, from, &self.root) {
                Ok(path) => candidates.push(path),
                Err(rejection) if rejection.is_security_violation() => {
                    ctx.warn(Warning::new(
                        WarningKind::SecurityViolation,
                        from,
                        value,
                        format!("layout reference rejected: {rejection}"),
                    ));
                    return None;
                }
                Err(_) => {}
            }
            if !value.starts_with('/') {
                if let Ok(path) = check_reference(&format!("/{value}"), from, &self.root) {
                    candidates.push(path);
                }
            }
            candidates
        };

        for candidate in &candidates {
            ctx.add_dependency(candidate);
            if self.reader.exists(candidate).await {
                debug!("Layout '{}' ({:?}) resolved to {}", value, choice.source, candidate.display());
                return Some(candidate.clone());
            }
        }

        ctx.warn(Warning::new(
            WarningKind::MissingReference,
            from,
            value,
            format!("layout not found: {value}"),
        ));
        None
    }

    fn short_name_candidates(&self, name: &str, from: &Path) -> Vec<PathBuf> {
        let file_name = format!("_{name}{LAYOUT_SUFFIX}");
        let mut candidates = Vec::new();

        let mut dir = from.parent();
        while let Some(current) = dir {
            if !is_within_root(current, &self.root) {
                break;
            }
            candidates.push(current.join(&file_name));
            dir = current.parent();
        }

        let layouts_dir = self.root.join(&self.config.layouts_dir);
        candidates.push(layouts_dir.join(format!("{name}.html")));
        candidates.push(layouts_dir.join(file_name));
        candidates
    }

    /// Nearest `_layout.html` from the page directory up to the root.
    ///
    /// Each directory checked on the way is recorded, so a `_layout.html`
    /// created closer to the page later takes over on rebuild.
    async fn implicit_layout(&self, page: &Path, ctx: &mut CompositionContext) -> Option<PathBuf> {
        let mut dir = page.parent();
        while let Some(current) = dir {
            if !is_within_root(current, &self.root) {
                break;
            }
            let candidate = current.join(IMPLICIT_LAYOUT_FILE);
            if candidate != page {
                ctx.add_dependency(&candidate);
                if self.reader.exists(&candidate).await {
                    return Some(candidate);
                }
            }
            dir = current.parent();
        }
        None
    }
}
