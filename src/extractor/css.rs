//! CSS reference scanning and `@import` following.

use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

use super::ReferenceExtractor;
use super::html::push_unique;
use crate::core::{Reference, ReferenceKind};
use crate::utils::fs::SourceReader;
use crate::utils::{is_external_reference, resolve_reference};

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+(?:url\(\s*)?["']?([^"')\s;]+)["']?"#).expect("valid import regex")
});

static FONT_FACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)@font-face\s*\{([^}]*)\}").expect("valid font-face regex"));

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*["']?([^"')]+?)["']?\s*\)"#).expect("valid url regex")
});

/// Classify a CSS `url()` target by its extension.
fn kind_for(raw: &str) -> ReferenceKind {
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "css" => ReferenceKind::Stylesheet,
        "woff" | "woff2" | "ttf" | "otf" | "eot" => ReferenceKind::Font,
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "avif" | "bmp" => {
            ReferenceKind::Image
        }
        "mp4" | "webm" | "ogg" | "mp3" | "wav" => ReferenceKind::Media,
        "js" | "mjs" => ReferenceKind::Script,
        _ => ReferenceKind::Generic,
    }
}

/// Scan stylesheet text for `@import`, `@font-face` sources and `url()` values.
///
/// Every URL inside an `@font-face` block is a font, whatever its extension.
pub fn extract(css: &str, path: &Path, root: &Path) -> Vec<Reference> {
    let mut refs = Vec::new();
    let push = |raw: &str, kind: ReferenceKind, refs: &mut Vec<Reference>| {
        let raw = raw.trim();
        if is_external_reference(raw) {
            return;
        }
        let to = resolve_reference(raw, path, root);
        trace!("css {kind} reference {raw} -> {:?}", to);
        push_unique(refs, Reference::new(path.to_path_buf(), to, kind, raw));
    };

    for cap in IMPORT.captures_iter(css) {
        push(&cap[1], ReferenceKind::Stylesheet, &mut refs);
    }
    for block in FONT_FACE.captures_iter(css) {
        for cap in URL.captures_iter(&block[1]) {
            push(&cap[1], ReferenceKind::Font, &mut refs);
        }
    }
    for cap in URL.captures_iter(css) {
        push(&cap[1], kind_for(&cap[1]), &mut refs);
    }

    refs
}

/// Recursive `@import` walker.
///
/// `visited` belongs to one top-level call. A stylesheet already in it is not
/// descended into again, which is what lets import cycles terminate.
pub struct CssImportWalker<'a, R: SourceReader> {
    extractor: &'a dyn ReferenceExtractor,
    reader: &'a R,
    root: &'a Path,
    max_depth: usize,
}

impl<'a, R: SourceReader> CssImportWalker<'a, R> {
    pub fn new(
        extractor: &'a dyn ReferenceExtractor,
        reader: &'a R,
        root: &'a Path,
        max_depth: usize,
    ) -> Self {
        Self {
            extractor,
            reader,
            root,
            max_depth,
        }
    }

    /// Every reference reachable from `css_path` through `@import`, including
    /// the import references themselves. Unreadable files contribute nothing.
    pub fn follow<'b>(
        &'b self,
        css_path: &'b Path,
        visited: &'b mut HashSet<PathBuf>,
        depth: usize,
    ) -> BoxFuture<'b, Vec<Reference>> {
        async move {
            if depth >= self.max_depth {
                warn!(
                    "CSS import depth limit ({}) reached at {}",
                    self.max_depth,
                    css_path.display()
                );
                return Vec::new();
            }

            let css = match self.reader.read_to_string(css_path).await {
                Ok(css) => css,
                Err(e) => {
                    debug!("Not following imports of {}: {}", css_path.display(), e);
                    return Vec::new();
                }
            };

            let mut found = Vec::new();
            for reference in self.extractor.from_css(&css, css_path, self.root) {
                let next = match (&reference.to, reference.kind) {
                    (Some(to), ReferenceKind::Stylesheet) => Some(to.clone()),
                    _ => None,
                };
                found.push(reference);

                if let Some(next) = next {
                    if visited.insert(next.clone()) {
                        found.extend(self.follow(&next, visited, depth + 1).await);
                    } else {
                        trace!("Already visited {}", next.display());
                    }
                }
            }
            found
        }
        .boxed()
    }
}
