//! Whole-page composition behavior.

use pagesmith::compose::{ComposeError, Composer, HeadFragment, merge_head};
use pagesmith::config::{BuildConfig, LayoutRule};
use pagesmith::core::WarningKind;
use pagesmith::utils::fs::MemoryReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn composer_with(reader: MemoryReader, config: BuildConfig) -> Composer<MemoryReader> {
    pagesmith::test_utils::init_test_logging(None);
    Composer::new(Arc::new(reader), Arc::new(config), "/src")
}

fn composer(reader: MemoryReader) -> Composer<MemoryReader> {
    composer_with(reader, BuildConfig::default())
}

#[tokio::test]
async fn test_include_cycle_names_the_chain() {
    let reader = MemoryReader::new()
        .with_file("/src/a.html", r#"<include src="b.html"/>"#)
        .with_file("/src/b.html", r#"<!--#include file="c.html"-->"#)
        .with_file("/src/c.html", r#"<!--#include virtual="/a.html"-->"#);

    let err = composer(reader)
        .compose(r#"<include src="b.html"/>"#, Path::new("/src/a.html"))
        .await
        .unwrap_err();

    let ComposeError::CircularDependency {
        chain,
        target,
    } = &err
    else {
        panic!("expected a cycle, got {err}");
    };
    let names: Vec<&str> = chain.iter().filter_map(|p| p.file_name()?.to_str()).collect();
    assert_eq!(names, vec!["a.html", "b.html", "c.html"]);
    assert_eq!(target, Path::new("/src/a.html"));
    assert_eq!(err.to_string(), "Circular dependency detected: /src/a.html → /src/b.html → /src/c.html → /src/a.html");
}

#[tokio::test]
async fn test_css_import_cycle_terminates() {
    let reader = MemoryReader::new()
        .with_file("/src/a.css", "@import 'b.css';")
        .with_file("/src/b.css", "@import url(c.css);")
        .with_file("/src/c.css", "@import \"a.css\";");

    let output = composer(reader)
        .compose(r#"<link rel="stylesheet" href="a.css">"#, Path::new("/src/index.html"))
        .await
        .unwrap();

    let expected: Vec<PathBuf> = ["a.css", "b.css", "c.css"].iter().map(|f| Path::new("/src").join(f)).collect();
    assert_eq!(output.assets, expected);
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn test_twelve_nested_includes_stop_at_depth_ten() {
    let reader = MemoryReader::new();
    for level in 1..=12 {
        let next = if level < 12 {
            format!(r#"<include src="_level{}.html"/>"#, level + 1)
        } else {
            String::new()
        };
        reader.insert(format!("/src/_level{level}.html"), format!("<div class=\"l{level}\">{next}</div>"));
    }

    let output = composer(reader)
        .compose(r#"<include src="_level1.html"/>"#, Path::new("/src/index.html"))
        .await
        .unwrap();

    assert!(output.content.contains(r#"<div class="l10">"#));
    assert!(!output.content.contains(r#"<div class="l11">"#));
    assert!(output.content.contains("include depth limit reached: _level11.html"));
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].kind, WarningKind::DepthExceeded);
}

#[tokio::test]
async fn test_slot_fallback_survives() {
    let reader = MemoryReader::new().with_file(
        "/src/_layout.html",
        r#"<html><body><aside><slot name="sidebar">Default</slot></aside><main><slot></slot></main></body></html>"#,
    );

    let output = composer(reader).compose("<p>Body</p>", Path::new("/src/index.html")).await.unwrap();
    assert!(output.content.contains("<aside>Default</aside>"));
    assert!(output.content.contains("<main><p>Body</p></main>"));
}

#[tokio::test]
async fn test_template_target_fills_named_slot() {
    let reader = MemoryReader::new().with_file(
        "/src/_layout.html",
        r#"<html><body><aside><slot name="sidebar">Default</slot></aside><main><slot></slot></main></body></html>"#,
    );

    let page = r#"<template target="sidebar"><ul><li>One</li></ul></template><p>Body</p>"#;
    let output = composer(reader).compose(page, Path::new("/src/index.html")).await.unwrap();
    assert!(output.content.contains("<aside><ul><li>One</li></ul></aside>"));
    assert!(!output.content.contains("Default"));
}

#[tokio::test]
async fn test_default_layout_rule_beats_implicit_layout() {
    let reader = MemoryReader::new()
        .with_file("/src/_layout.html", "<html><body>implicit<slot></slot></body></html>")
        .with_file("/src/_layouts/post.html", "<html><body>post<slot></slot></body></html>");
    let config = BuildConfig {
        default_layouts: vec![LayoutRule {
            pattern: "blog/**".to_string(),
            layout: "post".to_string(),
        }],
        ..BuildConfig::default()
    };
    let composer = composer_with(reader, config);

    let blog = composer.compose("<p>x</p>", Path::new("/src/blog/2024/hello.html")).await.unwrap();
    assert_eq!(blog.content, "<html><body>post<p>x</p></body></html>");

    let about = composer.compose("<p>x</p>", Path::new("/src/about.html")).await.unwrap();
    assert_eq!(about.content, "<html><body>implicit<p>x</p></body></html>");
}

#[tokio::test]
async fn test_full_document_ignores_implicit_layout() {
    let reader = MemoryReader::new().with_file("/src/_layout.html", "<html><body>wrapped<slot></slot></body></html>");
    let page = "<!DOCTYPE html><html><body><p>standalone</p></body></html>";

    let output = composer(reader).compose(page, Path::new("/src/index.html")).await.unwrap();
    assert_eq!(output.content, page);
    assert!(output.dependencies.is_empty());
}

#[tokio::test]
async fn test_layout_short_name_searches_up_the_tree() {
    let reader = MemoryReader::new()
        .with_file("/src/_docs.layout.html", "<html><body>root<slot></slot></body></html>")
        .with_file("/src/guide/_docs.layout.html", "<html><body>guide<slot></slot></body></html>");

    let output = composer(reader)
        .compose(r#"<section data-layout="docs">s</section>"#, Path::new("/src/guide/intro/start.html"))
        .await
        .unwrap();
    assert_eq!(output.content, "<html><body>guide<section>s</section></body></html>");
    // The nearer, missing candidate is recorded as well
    assert_eq!(
        output.dependencies,
        vec![PathBuf::from("/src/guide/intro/_docs.layout.html"), PathBuf::from("/src/guide/_docs.layout.html")]
    );
}

#[tokio::test]
async fn test_two_data_layouts_on_a_fragment_is_fatal() {
    let page = r#"<div data-layout="a">1</div><div data-layout="b">2</div>"#;
    let err = composer(MemoryReader::new()).compose(page, Path::new("/src/index.html")).await.unwrap_err();
    assert!(matches!(err, ComposeError::MalformedDirective { .. }));
}

#[tokio::test]
async fn test_head_merge_through_layout() {
    let reader = MemoryReader::new().with_file(
        "/src/_layouts/base.html",
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>Site</title><link rel="stylesheet" href="base.css"><script src="app.js"></script></head><body><slot></slot></body></html>"#,
    );
    let page = r#"<html lang="en-GB" data-page="home"><head><link rel="layout" href="/_layouts/base.html"><title>Home</title><link rel="stylesheet" href="base.css"><link rel="stylesheet" href="home.css"><script src="app.js" data-allow-duplicate></script></head><body><h1>Home</h1></body></html>"#;

    let output = composer(reader).compose(page, Path::new("/src/index.html")).await.unwrap();
    let html = &output.content;

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"<html lang="en-GB" data-page="home">"#));
    assert_eq!(html.matches("<title>").count(), 1);
    assert!(html.contains("<title>Home</title>"));
    assert_eq!(html.matches(r#"href="base.css""#).count(), 1);
    assert!(html.contains(r#"href="home.css""#));
    assert_eq!(html.matches(r#"src="app.js""#).count(), 2);
    assert!(html.contains("<h1>Home</h1>"));
}

#[test]
fn test_head_merger_example() {
    let merged = merge_head(&[
        HeadFragment::new("layout", r#"<title>Site</title><link rel="stylesheet" href="base.css">"#),
        HeadFragment::new("page", r#"<title>Page</title><link rel="stylesheet" href="base.css">"#),
    ]);
    assert_eq!(merged.matches("<title>").count(), 1);
    assert!(merged.contains("<title>Page</title>"));
    assert_eq!(merged.matches("base.css").count(), 1);
}
