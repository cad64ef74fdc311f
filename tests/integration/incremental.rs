//! Incremental rebuilds against a real directory tree.

use anyhow::Result;
use pagesmith::build::{PageStatus, write_site};
use pagesmith::config::BuildConfig;
use pagesmith::test_utils::TestSite;

async fn blog_site() -> Result<TestSite> {
    let site = TestSite::new()?;
    site.write("_layout.html", "<html><head><title>Site</title></head><body><slot></slot></body></html>").await?;
    site.write("_includes/footer.html", "<footer>v1</footer>").await?;
    site.write("index.html", r#"<p>home</p><include src="footer.html"/>"#).await?;
    site.write("blog/first.html", r#"<p>first</p><include src="footer.html"/>"#).await?;
    site.write("about.html", "<p>about</p>").await?;
    Ok(site)
}

#[tokio::test]
async fn test_editing_an_include_rebuilds_its_pages() -> Result<()> {
    let site = blog_site().await?;
    let builder = site.builder(BuildConfig::default());
    let report = builder.build().await?;
    assert_eq!(report.pages.len(), 3);
    assert_eq!(report.success_count(), 3);

    let footer = site.write("_includes/footer.html", "<footer>v2</footer>").await?;
    let report = builder.rebuild(&[footer]).await?;

    let rebuilt: Vec<&str> = report.pages.iter().map(|p| p.relative.as_str()).collect();
    assert_eq!(rebuilt, vec!["blog/first.html", "index.html"]);
    assert!(report.pages.iter().all(|p| p.content.as_deref().is_some_and(|c| c.contains("v2"))));
    Ok(())
}

#[tokio::test]
async fn test_deleting_an_include_leaves_markers_and_recovers_on_create() -> Result<()> {
    let site = blog_site().await?;
    let builder = site.builder(BuildConfig::default());
    builder.build().await?;

    let footer = site.delete("_includes/footer.html").await?;
    let report = builder.rebuild(std::slice::from_ref(&footer)).await?;
    assert_eq!(report.removed, vec![footer.clone()]);
    assert_eq!(report.warning_count(), 2);
    let index = report.page("index.html").and_then(|p| p.content.as_deref()).unwrap_or_default();
    assert!(index.contains("<!-- WARNING: include not found: footer.html -->"));

    // The pages recorded where the include would live, so creating it there
    // brings them back.
    let local = site.write("footer.html", "<footer>local</footer>").await?;
    let report = builder.rebuild(&[local]).await?;
    let page = report.page("index.html").expect("index.html is affected");
    assert_eq!(page.status, PageStatus::Success);
    assert!(page.content.as_deref().unwrap_or_default().contains("<footer>local</footer>"));
    Ok(())
}

#[tokio::test]
async fn test_layout_edit_rebuilds_every_fragment() -> Result<()> {
    let site = blog_site().await?;
    let builder = site.builder(BuildConfig::default());
    builder.build().await?;

    let layout = site.write("_layout.html", "<html><body><main><slot></slot></main></body></html>").await?;
    let affected = builder.affected_pages(&[layout]).await;
    assert_eq!(affected.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_nearer_layout_takes_over_on_rebuild() -> Result<()> {
    let site = blog_site().await?;
    let builder = site.builder(BuildConfig::default());
    builder.build().await?;

    let blog_layout = site.write("blog/_layout.html", "<html><body><article><slot></slot></article></body></html>").await?;
    let affected = builder.affected_pages(std::slice::from_ref(&blog_layout)).await;
    assert_eq!(affected, vec![site.source("blog/first.html")]);

    let report = builder.rebuild(&[blog_layout]).await?;
    let first = report.page("blog/first.html").and_then(|p| p.content.as_deref()).unwrap_or_default();
    assert!(first.contains("<article><p>first</p>"));
    Ok(())
}

#[tokio::test]
async fn test_local_include_shadows_includes_dir_on_rebuild() -> Result<()> {
    let site = blog_site().await?;
    let builder = site.builder(BuildConfig::default());
    builder.build().await?;

    let local = site.write("footer.html", "<footer>local</footer>").await?;
    let affected = builder.affected_pages(std::slice::from_ref(&local)).await;
    assert!(affected.contains(&site.source("index.html")));
    assert!(!affected.contains(&site.source("blog/first.html")));

    let report = builder.rebuild(&[local]).await?;
    let index = report.page("index.html").and_then(|p| p.content.as_deref()).unwrap_or_default();
    assert!(index.contains("<footer>local</footer>"));
    assert!(!index.contains("v1"));
    Ok(())
}

#[tokio::test]
async fn test_new_page_is_composed_on_rebuild() -> Result<()> {
    let site = blog_site().await?;
    let builder = site.builder(BuildConfig::default());
    builder.build().await?;

    let page = site.write("contact.html", "<p>mail me</p>").await?;
    let report = builder.rebuild(&[page]).await?;
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].relative, "contact.html");
    Ok(())
}

#[tokio::test]
async fn test_write_site_outputs_pages_and_assets() -> Result<()> {
    let site = blog_site().await?;
    site.write("img/photo.jpg", "jpeg").await?;
    site.write("about.html", r#"<p>about</p><img src="img/photo.jpg">"#).await?;

    let builder = site.builder(BuildConfig::default());
    let report = builder.build().await?;
    let summary = write_site(&report, builder.assets(), builder.root(), &site.output_dir).await?;
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.assets, 1);

    let about = site.read_output("about.html").await?;
    assert!(about.contains("<title>Site</title>"));
    assert!(about.contains(r#"<img src="img/photo.jpg">"#));
    assert!(site.output_dir.join("img/photo.jpg").exists());
    assert!(!site.output_dir.join("_layout.html").exists());

    let pages = builder.assets().pages_that_reference(&site.source("img/photo.jpg"));
    assert_eq!(pages, vec![builder.root().join("about.html")]);
    Ok(())
}
