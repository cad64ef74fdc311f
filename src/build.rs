//! Site build orchestration.
//!
//! [`SiteBuilder`] owns everything that outlives a single page: the shared
//! dependency graph, the asset index and the [`Composer`]. A full build
//! discovers every page under the source root and composes them with bounded
//! parallelism. An incremental [`rebuild`](SiteBuilder::rebuild) asks the graph
//! which pages depend on the changed files and recomposes only those.
//!
//! Each page is composed against its own context and then committed with one
//! graph update. A page that fails keeps its previous edges, so the next
//! rebuild still knows what it used to depend on.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagesmith::build::SiteBuilder;
//! use pagesmith::config::BuildConfig;
//! use pagesmith::utils::fs::DiskReader;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let builder = SiteBuilder::new(Arc::new(DiskReader), Arc::new(BuildConfig::default()), "site/src");
//! let report = builder.build().await?;
//! println!("{} pages, {} failed", report.pages.len(), report.fatal_count());
//!
//! // Later, after an edit
//! let report = builder.rebuild(&[Path::new("site/src/_header.html").to_path_buf()]).await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::compose::{ComposeError, Composer, FatalKind};
use crate::config::BuildConfig;
use crate::core::{PagesmithError, Warning};
use crate::extractor::AssetIndex;
use crate::graph::{DependentsCache, SharedGraph};
use crate::utils::fs::{SourceReader, atomic_write, copy_file};
use crate::utils::{is_within_root, normalize_path, relative_to_root};

/// Outcome of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PageStatus {
    Success,
    Warning,
    Fatal {
        kind: FatalKind,
        message: String,
    },
}

/// Per-page entry of a [`BuildReport`].
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub path: PathBuf,
    /// Root-relative path, also the output path
    pub relative: String,
    #[serde(flatten)]
    pub status: PageStatus,
    pub warnings: Vec<Warning>,
    pub dependencies: usize,
    /// Composed HTML; `None` for fatal pages
    #[serde(skip)]
    pub content: Option<String>,
}

/// Result of a build or rebuild pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Pages in root-relative order
    pub pages: Vec<PageReport>,
    /// Files that no longer exist and were dropped from the graph
    pub removed: Vec<PathBuf>,
}

impl BuildReport {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.pages.iter().filter(|p| p.status == PageStatus::Success).count()
    }

    /// Pages that composed but produced warnings
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.pages.iter().filter(|p| p.status == PageStatus::Warning).count()
    }

    #[must_use]
    pub fn fatal_count(&self) -> usize {
        self.pages.iter().filter(|p| matches!(p.status, PageStatus::Fatal { .. })).count()
    }

    /// Warnings across all pages
    #[must_use]
    pub fn total_warnings(&self) -> usize {
        self.pages.iter().map(|p| p.warnings.len()).sum()
    }

    #[must_use]
    pub fn page(&self, relative: &str) -> Option<&PageReport> {
        self.pages.iter().find(|p| p.relative == relative)
    }
}

/// Files written by [`write_site`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub pages: usize,
    pub assets: usize,
}

/// Orchestrates full and incremental builds of one source tree.
pub struct SiteBuilder<R: SourceReader> {
    composer: Composer<R>,
    config: Arc<BuildConfig>,
    graph: SharedGraph,
    assets: Arc<AssetIndex>,
}

impl<R: SourceReader> SiteBuilder<R> {
    pub fn new(reader: Arc<R>, config: Arc<BuildConfig>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            composer: Composer::new(reader, Arc::clone(&config), source_root),
            config,
            graph: SharedGraph::new(),
            assets: Arc::new(AssetIndex::new()),
        }
    }

    pub fn root(&self) -> &Path {
        self.composer.root()
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn assets(&self) -> &AssetIndex {
        &self.assets
    }

    pub fn composer(&self) -> &Composer<R> {
        &self.composer
    }

    /// Discover and compose every page under the source root.
    ///
    /// # Errors
    ///
    /// Returns an error if the source root does not exist. Page failures are
    /// reported in the [`BuildReport`], not returned.
    pub async fn build(&self) -> Result<BuildReport> {
        let pages = discover_pages(self.root(), &self.config)?;
        info!("Building {} pages from {}", pages.len(), self.root().display());
        Ok(self.build_pages(pages).await)
    }

    /// Compose the given pages in parallel and commit each successful one.
    pub async fn build_pages(&self, pages: Vec<PathBuf>) -> BuildReport {
        let concurrency = self.config.concurrency();
        debug!("Composing {} pages with concurrency {}", pages.len(), concurrency);

        let mut reports: Vec<PageReport> = stream::iter(pages)
            .map(|page| async move { self.build_page(&page).await })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        reports.sort_by(|a, b| a.relative.cmp(&b.relative));

        let report = BuildReport {
            pages: reports,
            removed: Vec::new(),
        };
        info!(
            "Composed {} pages: {} ok, {} with warnings, {} failed",
            report.pages.len(),
            report.success_count(),
            report.warning_count(),
            report.fatal_count()
        );
        report
    }

    async fn build_page(&self, page: &Path) -> PageReport {
        let path = normalize_path(page);
        let relative = relative_to_root(&path, self.root());

        let result = match self.composer.reader().read_to_string(&path).await {
            Ok(content) => self.composer.compose_and_commit(&content, &path, &self.graph).await,
            Err(source) => Err(ComposeError::Read {
                path: path.clone(),
                source,
            }),
        };

        match result {
            Ok(output) => {
                self.assets.replace(&path, output.assets.iter().cloned());
                let status = if output.warnings.is_empty() {
                    PageStatus::Success
                } else {
                    PageStatus::Warning
                };
                PageReport {
                    path,
                    relative,
                    status,
                    dependencies: output.dependencies.len(),
                    warnings: output.warnings,
                    content: Some(output.content),
                }
            }
            Err(err) => {
                warn!("Failed to compose {}: {}", relative, err);
                PageReport {
                    path,
                    relative,
                    status: PageStatus::Fatal {
                        kind: err.kind(),
                        message: err.to_string(),
                    },
                    warnings: Vec::new(),
                    dependencies: 0,
                    content: None,
                }
            }
        }
    }

    /// Pages that must be recomposed after `changed` files were edited,
    /// created or deleted. Changed pages are included themselves.
    pub async fn affected_pages(&self, changed: &[PathBuf]) -> Vec<PathBuf> {
        let mut cache = DependentsCache::new();
        let mut affected = BTreeSet::new();

        for file in changed {
            let file = normalize_path(file);
            let dependents = self.graph.transitive_dependents(&file, Some(&mut cache)).await;
            debug!("{} affects {} pages", relative_to_root(&file, self.root()), dependents.len());
            affected.extend(dependents);

            if is_within_root(&file, self.root())
                && self.config.is_page_candidate(&relative_to_root(&file, self.root()))
            {
                affected.insert(file);
            }
        }
        affected.into_iter().collect()
    }

    /// Recompose everything affected by `changed`.
    ///
    /// Deleted files are dropped from the graph and asset index first; pages
    /// that used them are recomposed and will record them as missing.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` leaves room for discovery errors.
    pub async fn rebuild(&self, changed: &[PathBuf]) -> Result<BuildReport> {
        let affected = self.affected_pages(changed).await;

        let mut removed = Vec::new();
        for file in changed {
            let file = normalize_path(file);
            if !self.composer.reader().exists(&file).await {
                self.graph.remove(&file).await;
                self.assets.remove(&file);
                removed.push(file);
            }
        }

        let mut pages = Vec::new();
        for page in affected {
            if removed.contains(&page) {
                continue;
            }
            pages.push(page);
        }

        info!("Rebuilding {} pages for {} changed files", pages.len(), changed.len());
        let mut report = self.build_pages(pages).await;
        report.removed = removed;
        Ok(report)
    }
}

/// Every page candidate under `root`, sorted.
///
/// # Errors
///
/// Returns [`PagesmithError::SourceRootMissing`] if `root` is not a directory.
pub fn discover_pages(root: &Path, config: &BuildConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PagesmithError::SourceRootMissing {
            path: root.to_path_buf(),
        }
        .into());
    }
    let root = normalize_path(root);

    let mut pages = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(false) // Symlinks could lead out of the source root
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = normalize_path(entry.path());
        if config.is_page_candidate(&relative_to_root(&path, &root)) {
            pages.push(path);
        }
    }
    pages.sort();
    debug!("Discovered {} pages under {}", pages.len(), root.display());
    Ok(pages)
}

/// Write composed pages and copy referenced assets into `output_root`.
///
/// Fatal pages are skipped. Assets that do not exist are skipped; their pages
/// already carry a warning.
///
/// # Errors
///
/// Returns an error if a write or copy fails.
pub async fn write_site(
    report: &BuildReport,
    assets: &AssetIndex,
    source_root: &Path,
    output_root: &Path,
) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();

    for page in &report.pages {
        let Some(content) = &page.content else { continue };
        let target = output_root.join(&page.relative);
        atomic_write(&target, content.as_bytes())
            .await
            .with_context(|| format!("Failed to write page {}", page.relative))?;
        summary.pages += 1;
    }

    for asset in assets.all_referenced_assets() {
        if !tokio::fs::try_exists(&asset).await.unwrap_or(false) {
            continue;
        }
        let relative = relative_to_root(&asset, source_root);
        copy_file(&asset, &output_root.join(&relative)).await?;
        summary.assets += 1;
    }

    info!(
        "Wrote {} pages and {} assets to {}",
        summary.pages,
        summary.assets,
        output_root.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fs::{DiskReader, MemoryReader};

    fn memory_site() -> Arc<MemoryReader> {
        Arc::new(
            MemoryReader::new()
                .with_file("/s/_header.html", "<header>H</header>")
                .with_file("/s/index.html", r#"<include src="_header.html"/><p>home</p>"#)
                .with_file("/s/about.html", r#"<include src="_header.html"/><img src="me.png">"#)
                .with_file("/s/me.png", "png")
                .with_file("/s/loop.html", r#"<include src="loop.html"/>"#),
        )
    }

    fn pages() -> Vec<PathBuf> {
        ["about.html", "index.html", "loop.html"].iter().map(|p| Path::new("/s").join(p)).collect()
    }

    #[tokio::test]
    async fn test_build_pages_reports_each_page() {
        let builder = SiteBuilder::new(memory_site(), Arc::new(BuildConfig::default()), "/s");
        let report = builder.build_pages(pages()).await;

        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.fatal_count(), 1);
        assert!(matches!(
            report.page("loop.html").map(|p| &p.status),
            Some(PageStatus::Fatal {
                kind: FatalKind::CircularDependency,
                ..
            })
        ));
        assert_eq!(
            report.page("index.html").and_then(|p| p.content.as_deref()),
            Some("<header>H</header><p>home</p>")
        );

        assert!(builder.assets().is_asset_referenced(Path::new("/s/me.png")));
        let graph = builder.graph().snapshot().await;
        assert!(graph.is_consistent());
        // The failed page committed nothing
        assert!(graph.direct_dependencies(Path::new("/s/loop.html")).is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_recomposes_dependents_only() {
        let reader = memory_site();
        let builder = SiteBuilder::new(Arc::clone(&reader), Arc::new(BuildConfig::default()), "/s");
        builder.build_pages(pages()).await;

        let affected = builder.affected_pages(&[PathBuf::from("/s/me.png")]).await;
        assert_eq!(affected, vec![PathBuf::from("/s/about.html")]);

        reader.insert("/s/_header.html", "<header>New</header>");
        let report = builder.rebuild(&[PathBuf::from("/s/_header.html")]).await.unwrap();
        let rebuilt: Vec<&str> = report.pages.iter().map(|p| p.relative.as_str()).collect();
        assert_eq!(rebuilt, vec!["about.html", "index.html"]);
        assert_eq!(
            report.page("index.html").and_then(|p| p.content.as_deref()),
            Some("<header>New</header><p>home</p>")
        );
    }

    #[tokio::test]
    async fn test_rebuild_after_delete() {
        let reader = memory_site();
        let builder = SiteBuilder::new(Arc::clone(&reader), Arc::new(BuildConfig::default()), "/s");
        builder.build_pages(pages()).await;

        reader.remove(Path::new("/s/me.png"));
        let report = builder.rebuild(&[PathBuf::from("/s/me.png")]).await.unwrap();

        assert_eq!(report.removed, vec![PathBuf::from("/s/me.png")]);
        let about = report.page("about.html").unwrap();
        assert_eq!(about.status, PageStatus::Warning);
        // Recorded again as a missing dependency
        let graph = builder.graph().snapshot().await;
        assert_eq!(graph.direct_dependents(Path::new("/s/me.png")), vec![PathBuf::from("/s/about.html")]);
    }

    #[tokio::test]
    async fn test_build_and_write_on_disk() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let src = temp.path().join("src");
        tokio::fs::create_dir_all(src.join("blog")).await?;
        tokio::fs::create_dir_all(src.join("img")).await?;
        tokio::fs::write(src.join("_layout.html"), "<html><body><slot></slot></body></html>").await?;
        tokio::fs::write(src.join("index.html"), r#"<img src="img/a.png">"#).await?;
        tokio::fs::write(src.join("blog/post.html"), "<p>post</p>").await?;
        tokio::fs::write(src.join("img/a.png"), "png").await?;

        let builder = SiteBuilder::new(Arc::new(DiskReader), Arc::new(BuildConfig::default()), &src);
        let report = builder.build().await?;
        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.success_count(), 2);

        let out = temp.path().join("dist");
        let summary = write_site(&report, builder.assets(), builder.root(), &out).await?;
        assert_eq!(summary, WriteSummary { pages: 2, assets: 1 });

        let post = tokio::fs::read_to_string(out.join("blog/post.html")).await?;
        assert_eq!(post, "<html><body><p>post</p></body></html>");
        assert!(out.join("img/a.png").exists());
        Ok(())
    }

    #[test]
    fn test_discover_missing_root() {
        let err = discover_pages(Path::new("/definitely/not/here"), &BuildConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PagesmithError>(),
            Some(PagesmithError::SourceRootMissing { .. })
        ));
    }
}
