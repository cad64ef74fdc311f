//! Properties of the recorded dependency graph.

use pagesmith::build::SiteBuilder;
use pagesmith::config::BuildConfig;
use pagesmith::core::FileRole;
use pagesmith::graph::SharedGraph;
use pagesmith::utils::fs::MemoryReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn site() -> MemoryReader {
    MemoryReader::new()
        .with_file("/src/_layout.html", r#"<html><head><link rel="stylesheet" href="/css/site.css"></head><body><include src="_nav.html"/><slot></slot></body></html>"#)
        .with_file("/src/_nav.html", r#"<nav><img src="/img/logo.svg"></nav>"#)
        .with_file("/src/css/site.css", "@import 'base.css';")
        .with_file("/src/css/base.css", "body{}")
        .with_file("/src/img/logo.svg", "<svg/>")
        .with_file("/src/index.html", "<p>home</p>")
        .with_file("/src/blog/post.html", r#"<p>post</p><include src="/index.html"/>"#)
}

fn pages() -> Vec<PathBuf> {
    vec![PathBuf::from("/src/index.html"), PathBuf::from("/src/blog/post.html")]
}

#[tokio::test]
async fn test_composing_twice_is_idempotent() {
    let builder = SiteBuilder::new(Arc::new(site()), Arc::new(BuildConfig::default()), "/src");

    let first = builder.build_pages(pages()).await;
    let graph_after_first = builder.graph().snapshot().await;
    let second = builder.build_pages(pages()).await;
    let graph_after_second = builder.graph().snapshot().await;

    assert_eq!(graph_after_first, graph_after_second);
    for (a, b) in first.pages.iter().zip(&second.pages) {
        assert_eq!(a.content, b.content);
    }
}

#[tokio::test]
async fn test_graph_stays_consistent_and_complete() {
    let builder = SiteBuilder::new(Arc::new(site()), Arc::new(BuildConfig::default()), "/src");
    let report = builder.build_pages(pages()).await;
    assert_eq!(report.fatal_count(), 0);

    let graph = builder.graph().snapshot().await;
    assert!(graph.is_consistent());

    let deps = graph.direct_dependencies(Path::new("/src/index.html"));
    for expected in ["/src/_layout.html", "/src/_nav.html", "/src/css/site.css", "/src/css/base.css", "/src/img/logo.svg"] {
        assert!(deps.contains(&PathBuf::from(expected)), "missing {expected} in {deps:?}");
    }

    // index.html is a page and, through post.html's include, also a dependency
    assert_eq!(graph.file_role(Path::new("/src/index.html")), FileRole::Both);
    assert_eq!(graph.file_role(Path::new("/src/_nav.html")), FileRole::Dependency);

    let affected = graph.transitive_dependents(Path::new("/src/css/base.css"), None);
    assert_eq!(affected, vec![PathBuf::from("/src/blog/post.html"), PathBuf::from("/src/index.html")]);
}

#[tokio::test]
async fn test_recording_replaces_edges() {
    let graph = SharedGraph::new();
    let page = Path::new("/src/index.html");

    graph.commit(page, [PathBuf::from("/src/a.css"), PathBuf::from("/src/b.css")]).await;
    graph.commit(page, [PathBuf::from("/src/b.css")]).await;

    let snapshot = graph.snapshot().await;
    assert!(snapshot.is_consistent());
    assert!(snapshot.direct_dependents(Path::new("/src/a.css")).is_empty());
    assert_eq!(snapshot.direct_dependencies(page), vec![PathBuf::from("/src/b.css")]);

    graph.remove(page).await;
    assert!(graph.snapshot().await.is_empty());
}
