//! Regex scanners for asset references in HTML.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

use super::css;
use crate::core::{Reference, ReferenceKind};
use crate::utils::{is_external_reference, resolve_reference};

/// Optional `?query` / `#fragment` tail after an extension.
const TAIL: &str = r#"(?:[?#][^"']*)?"#;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid html reference regex")
}

/// Asset patterns in priority order. When two patterns hit the same target,
/// the earlier pattern decides the reference kind. Group 1 is always the path.
static PATTERNS: LazyLock<Vec<(Regex, ReferenceKind)>> = LazyLock::new(|| {
    vec![
        (
            pattern(&format!(
                r#"(?is)<link\b[^>]*?\shref\s*=\s*["']([^"']+?\.css{TAIL})["']"#
            )),
            ReferenceKind::Stylesheet,
        ),
        (
            pattern(&format!(
                r#"(?is)<script\b[^>]*?\ssrc\s*=\s*["']([^"']+?\.m?js{TAIL})["']"#
            )),
            ReferenceKind::Script,
        ),
        (
            pattern(&format!(
                r#"(?is)<img\b[^>]*?\ssrc\s*=\s*["']([^"']+?\.(?:png|jpe?g|gif|svg|webp|ico){TAIL})["']"#
            )),
            ReferenceKind::Image,
        ),
        // Icon links, rel before href and href before rel
        (
            pattern(
                r#"(?is)<link\b[^>]*?\srel\s*=\s*["'](?:icon|apple-touch-icon|shortcut icon)["'][^>]*?\shref\s*=\s*["']([^"']+)["']"#,
            ),
            ReferenceKind::Image,
        ),
        (
            pattern(
                r#"(?is)<link\b[^>]*?\shref\s*=\s*["']([^"']+)["'][^>]*?\srel\s*=\s*["'](?:icon|apple-touch-icon|shortcut icon)["']"#,
            ),
            ReferenceKind::Image,
        ),
        (
            pattern(
                r#"(?is)\sstyle\s*=\s*["'][^"']*?background(?:-image)?\s*:[^"']*?url\(\s*['"]?([^'")\s]+)['"]?\s*\)"#,
            ),
            ReferenceKind::Image,
        ),
        (
            pattern(&format!(
                r#"(?is)<link\b[^>]*?\shref\s*=\s*["']([^"']+?\.(?:woff2?|ttf|otf|eot){TAIL})["']"#
            )),
            ReferenceKind::Font,
        ),
        (
            pattern(r#"(?is)<(?:video|audio)\b[^>]*?\ssrc\s*=\s*["']([^"']+)["']"#),
            ReferenceKind::Media,
        ),
        (
            pattern(r#"(?is)<video\b[^>]*?\sposter\s*=\s*["']([^"']+)["']"#),
            ReferenceKind::Image,
        ),
        (
            pattern(r#"(?is)<source\b[^>]*?\ssrc\s*=\s*["']([^"']+)["']"#),
            ReferenceKind::Media,
        ),
        (
            pattern(r#"(?is)<object\b[^>]*?\sdata\s*=\s*["']([^"']+)["']"#),
            ReferenceKind::Object,
        ),
        (
            pattern(&format!(
                r#"(?is)\s(?:href|src)\s*=\s*["']([^"']+?\.(?:pdf|zip|docx?|txt|json){TAIL})["']"#
            )),
            ReferenceKind::Generic,
        ),
    ]
});

/// `srcset` on `<img>` and `<source>`. Group 1 or 2 is the candidate list.
static SRCSET: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"(?is)<(?:img|source)\b[^>]*?\ssrcset\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
});

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<style\b[^>]*>(.*?)</style\s*>"));

/// Scan `html` for asset references.
///
/// External and `data:` targets are skipped before resolution. Unsafe targets
/// are kept with `to: None` so the caller can warn about them. Results are
/// deduplicated by resolved target (raw text for unresolved ones), in
/// document-independent pattern order.
pub fn extract(html: &str, path: &Path, root: &Path) -> Vec<Reference> {
    let mut refs: Vec<Reference> = Vec::new();

    for (regex, kind) in PATTERNS.iter() {
        for cap in regex.captures_iter(html) {
            let Some(raw) = cap.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if is_external_reference(raw) {
                continue;
            }
            let to = resolve_reference(raw, path, root);
            trace!("html {} reference {raw} -> {:?}", kind, to);
            push_unique(&mut refs, Reference::new(path.to_path_buf(), to, *kind, raw));
        }
    }

    for cap in SRCSET.captures_iter(html) {
        let Some(list) = cap.get(1).or_else(|| cap.get(2)) else {
            continue;
        };
        // `a.png 1x, b.png 2x`: the URL is the first token of each candidate
        for raw in list.as_str().split(',').filter_map(|c| c.split_whitespace().next()) {
            if is_external_reference(raw) {
                continue;
            }
            let to = resolve_reference(raw, path, root);
            trace!("html srcset reference {raw} -> {:?}", to);
            push_unique(&mut refs, Reference::new(path.to_path_buf(), to, ReferenceKind::Image, raw));
        }
    }

    for cap in STYLE_BLOCK.captures_iter(html) {
        if let Some(block) = cap.get(1) {
            for reference in css::extract(block.as_str(), path, root) {
                push_unique(&mut refs, reference);
            }
        }
    }

    refs
}

/// Append unless a reference to the same target is already present.
pub(crate) fn push_unique(refs: &mut Vec<Reference>, reference: Reference) {
    let duplicate = refs.iter().any(|existing| match (&existing.to, &reference.to) {
        (Some(a), Some(b)) => a == b,
        (None, None) => existing.raw == reference.raw,
        _ => false,
    });
    if !duplicate {
        refs.push(reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn targets(refs: &[Reference]) -> Vec<(ReferenceKind, PathBuf)> {
        refs.iter().filter_map(|r| r.to.clone().map(|to| (r.kind, to))).collect()
    }

    #[test]
    fn test_extracts_core_asset_kinds() {
        let html = r#"
            <link rel="stylesheet" href="css/site.css">
            <script defer src="/js/app.js"></script>
            <img alt="logo" src="img/logo.png">
            <video src="media/intro.mp4"></video>
            <object data="docs/manual.pdf"></object>
            <a href="files/report.pdf">report</a>
        "#;
        let refs = extract(html, Path::new("/site/index.html"), Path::new("/site"));
        let found = targets(&refs);

        assert!(found.contains(&(ReferenceKind::Stylesheet, "/site/css/site.css".into())));
        assert!(found.contains(&(ReferenceKind::Script, "/site/js/app.js".into())));
        assert!(found.contains(&(ReferenceKind::Image, "/site/img/logo.png".into())));
        assert!(found.contains(&(ReferenceKind::Media, "/site/media/intro.mp4".into())));
        assert!(found.contains(&(ReferenceKind::Object, "/site/docs/manual.pdf".into())));
        assert!(found.contains(&(ReferenceKind::Generic, "/site/files/report.pdf".into())));
    }

    #[test]
    fn test_icon_links_in_both_attribute_orders() {
        let html = r#"
            <link rel="icon" href="favicon.svg">
            <link href="touch.png" rel="apple-touch-icon">
        "#;
        let refs = extract(html, Path::new("/site/index.html"), Path::new("/site"));
        let found = targets(&refs);
        assert!(found.contains(&(ReferenceKind::Image, "/site/favicon.svg".into())));
        assert!(found.contains(&(ReferenceKind::Image, "/site/touch.png".into())));
    }

    #[test]
    fn test_inline_style_and_style_block() {
        let html = r#"
            <div style="background-image: url('img/hero.jpg')"></div>
            <style>
              @import "theme.css";
              .x { background: url(img/tile.webp); }
            </style>
        "#;
        let refs = extract(html, Path::new("/site/index.html"), Path::new("/site"));
        let found = targets(&refs);
        assert!(found.contains(&(ReferenceKind::Image, "/site/img/hero.jpg".into())));
        assert!(found.contains(&(ReferenceKind::Stylesheet, "/site/theme.css".into())));
        assert!(found.contains(&(ReferenceKind::Image, "/site/img/tile.webp".into())));
    }

    #[test]
    fn test_skips_external_and_keeps_unsafe_unresolved() {
        let html = r#"
            <link rel="stylesheet" href="https://cdn.example.com/x.css">
            <img src="data:image/png;base64,AAAA">
            <img src="../../etc/passwd.png">
        "#;
        let refs = extract(html, Path::new("/site/index.html"), Path::new("/site"));
        assert_eq!(refs.len(), 1);
        assert!(refs[0].to.is_none());
        assert_eq!(refs[0].raw, "../../etc/passwd.png");
    }

    #[test]
    fn test_deduplicates_by_target() {
        let html = r#"
            <link rel="stylesheet" href="a.css">
            <link rel="stylesheet" href="./a.css?v=2">
        "#;
        let refs = extract(html, Path::new("/site/index.html"), Path::new("/site"));
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].to.as_deref(), Some(Path::new("/site/a.css")));
    }

    #[test]
    fn test_srcset_and_poster() {
        let html = r#"
            <img src="img/a.png" srcset="img/a.png 1x, img/a@2x.png 2x">
            <picture><source type="image/webp" srcset='img/wide.webp 1200w,img/narrow.webp 600w'></picture>
            <video poster="media/still.jpg" src="media/clip.mp4"></video>
        "#;
        let refs = extract(html, Path::new("/site/index.html"), Path::new("/site"));
        let found = targets(&refs);
        for image in ["img/a.png", "img/a@2x.png", "img/wide.webp", "img/narrow.webp", "media/still.jpg"] {
            assert!(found.contains(&(ReferenceKind::Image, Path::new("/site").join(image))), "{image}");
        }
        assert_eq!(found.iter().filter(|(_, to)| to.ends_with("img/a.png")).count(), 1);
        assert!(found.contains(&(ReferenceKind::Media, "/site/media/clip.mp4".into())));
    }

    #[test]
    fn test_font_link() {
        let html = r#"<link rel="preload" as="font" href="fonts/inter.woff2" crossorigin>"#;
        let refs = extract(html, Path::new("/site/index.html"), Path::new("/site"));
        assert_eq!(targets(&refs), vec![(ReferenceKind::Font, "/site/fonts/inter.woff2".into())]);
    }
}
