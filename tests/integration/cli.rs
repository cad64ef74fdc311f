//! The `pagesmith` command, driven through `Cli::execute_with_config`.

use anyhow::Result;
use clap::Parser;
use pagesmith::cli::{Cli, CliConfig};
use pagesmith::core::PagesmithError;
use pagesmith::test_utils::TestSite;

fn cli(site: &TestSite, args: &[&str]) -> Cli {
    let root = site.project_dir.to_string_lossy().into_owned();
    let mut argv = vec!["pagesmith", "--quiet", "--root", root.as_str()];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

#[tokio::test]
async fn test_build_writes_output() -> Result<()> {
    let site = TestSite::new()?;
    site.write("_layout.html", "<html><body><slot></slot></body></html>").await?;
    site.write("index.html", "<h1>Hello</h1>").await?;

    cli(&site, &["build"]).execute_with_config(CliConfig::new()).await?;

    assert_eq!(site.read_output("index.html").await?, "<html><body><h1>Hello</h1></body></html>");
    Ok(())
}

#[tokio::test]
async fn test_build_honours_config_file() -> Result<()> {
    let site = TestSite::new()?;
    site.write_config("output = \"public\"\n").await?;
    site.write("index.html", "<p>x</p>").await?;

    cli(&site, &["build"]).execute_with_config(CliConfig::new()).await?;

    assert!(site.project_dir.join("public/index.html").exists());
    assert!(!site.output_dir.exists());
    Ok(())
}

#[tokio::test]
async fn test_fail_on_warning() -> Result<()> {
    let site = TestSite::new()?;
    site.write("index.html", r#"<include src="_missing.html"/>"#).await?;

    // Warnings alone pass at the default level
    cli(&site, &["build", "--dry-run"]).execute_with_config(CliConfig::new()).await?;

    let err = cli(&site, &["build", "--dry-run", "--fail-on", "warning"])
        .execute_with_config(CliConfig::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PagesmithError>(),
        Some(PagesmithError::BuildFailed {
            fatal: 0,
            warnings: 1
        })
    ));
    Ok(())
}

#[tokio::test]
async fn test_cycle_fails_build_at_default_level() -> Result<()> {
    let site = TestSite::new()?;
    site.write("index.html", r#"<include src="_a.html"/>"#).await?;
    site.write("_a.html", r#"<include src="index.html"/>"#).await?;

    let err = cli(&site, &["build", "--dry-run"]).execute_with_config(CliConfig::new()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PagesmithError>(),
        Some(PagesmithError::BuildFailed {
            fatal: 1,
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn test_deps_rejects_unknown_format() -> Result<()> {
    let site = TestSite::new()?;
    site.write("index.html", "<p>x</p>").await?;

    let root = site.project_dir.to_string_lossy().into_owned();
    assert!(Cli::try_parse_from(["pagesmith", "--root", root.as_str(), "deps", "index.html", "--format", "yaml"]).is_err());

    cli(&site, &["deps", "index.html", "--format", "json"]).execute_with_config(CliConfig::new()).await?;
    Ok(())
}

#[tokio::test]
async fn test_missing_source_directory() -> Result<()> {
    let site = TestSite::new()?;
    std::fs::remove_dir_all(&site.source_dir)?;

    let err = cli(&site, &["build"]).execute_with_config(CliConfig::new()).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<PagesmithError>(), Some(PagesmithError::SourceRootMissing { .. })));
    Ok(())
}
