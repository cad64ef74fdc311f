//! Hostile references in real pages.

use pagesmith::compose::Composer;
use pagesmith::config::BuildConfig;
use pagesmith::core::WarningKind;
use pagesmith::utils::fs::MemoryReader;
use pagesmith::utils::resolve_reference;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[test]
fn test_resolver_examples() {
    let page = Path::new("/src/index.html");
    let root = Path::new("/src");

    assert_eq!(resolve_reference("../../etc/passwd", page, root), None);
    assert_eq!(resolve_reference("assets/a.css", page, root), Some(PathBuf::from("/src/assets/a.css")));
}

#[test]
fn test_hostile_reference_table() {
    let page = Path::new("/src/blog/post.html");
    let root = Path::new("/src");

    let rejected = [
        "",
        "data:image/png;base64,AAAA",
        "https://cdn.example.com/x.css",
        "//evil.example/x.js",
        "javascript:alert(1)",
        "JaVaScRiPt:alert(1)",
        "\\\\server\\share\\x.css",
        "C:/Windows/win.ini",
        "/etc/passwd",
        "%2e%2e/%2e%2e/secret.html",
        "%252e%252e/secret.html",
        "..%2f..%2fsecret.html",
        "x%00.css",
        "..",
        "../../../outside.css",
        "shell.php.jpg",
        "run.exe",
        "#top",
    ];
    for raw in rejected {
        assert_eq!(resolve_reference(raw, page, root), None, "{raw:?} should be rejected");
    }

    assert_eq!(resolve_reference("../css/site.css?v=3#x", page, root), Some(PathBuf::from("/src/css/site.css")));
    assert_eq!(resolve_reference("/img/a.png", page, root), Some(PathBuf::from("/src/img/a.png")));
}

#[test]
fn test_localized_page_names_resolve() {
    let page = Path::new("/src/index.html");
    let root = Path::new("/src");

    assert_eq!(resolve_reference("about.pl.html", page, root), Some(PathBuf::from("/src/about.pl.html")));
    assert_eq!(resolve_reference("/sh/index.sh.html", page, root), Some(PathBuf::from("/src/sh/index.sh.html")));
}

#[tokio::test]
async fn test_hostile_references_become_warnings_not_edges() {
    let reader = MemoryReader::new().with_file("/src/ok.css", "");
    let composer = Composer::new(Arc::new(reader), Arc::new(BuildConfig::default()), "/src");

    let page = r#"<link rel="stylesheet" href="ok.css">
<link rel="stylesheet" href="../../../etc/shadow.css">
<img src="%2e%2e/%2e%2e/secret.png">
<include src="../../etc/passwd"/>
<script src="https://cdn.example.com/lib.js"></script>"#;

    let output = composer.compose(page, Path::new("/src/index.html")).await.unwrap();

    assert_eq!(output.dependencies, vec![PathBuf::from("/src/ok.css"), PathBuf::from("/src/_layout.html")]);
    assert!(output.warnings.iter().all(|w| w.kind == WarningKind::SecurityViolation));
    assert_eq!(output.warnings.len(), 3);
    assert!(output.dependencies.iter().all(|d| d.starts_with("/src")));
}
