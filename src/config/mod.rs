//! Build configuration for pagesmith
//!
//! A project is configured by an optional `pagesmith.toml` in its root. Every
//! key has a default, so an empty file (or none at all) is a valid config.
//!
//! ```toml
//! source = "src"
//! output = "dist"
//! includes_dir = "_includes"
//! layouts_dir = "_layouts"
//! component_patterns = ["_*.html", "_includes/**"]
//! layout_patterns = ["_layout.html", "_*.layout.html", "_layouts/**"]
//! max_include_depth = 10
//!
//! [[default_layouts]]
//! pattern = "blog/**"
//! layout = "post"
//!
//! [[default_layouts]]
//! pattern = "**"
//! layout = "site"
//! ```
//!
//! Patterns use glob syntax and are matched against root-relative paths with
//! `/` separators. A pattern without a `/` is also tried against the file name
//! alone, so `_*.html` matches `blog/_card.html`.

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_INCLUDES_DIR, DEFAULT_LAYOUTS_DIR, DEFAULT_MAX_CSS_IMPORT_DEPTH,
    DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_DIR,
};
use crate::core::PagesmithError;

/// One ordered default-layout rule. The first rule whose pattern matches a
/// fragment page supplies its layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRule {
    pub pattern: String,
    /// Short name, root-relative path (`/…`) or path relative to the root
    pub layout: String,
}

/// Everything the compositor and build orchestrator need to know about a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    pub includes_dir: String,
    pub layouts_dir: String,
    pub component_patterns: Vec<String>,
    pub layout_patterns: Vec<String>,
    pub default_layouts: Vec<LayoutRule>,
    pub max_include_depth: usize,
    pub max_css_import_depth: usize,
    /// Concurrent page compositions. `None` uses the available parallelism.
    pub max_parallel: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            includes_dir: DEFAULT_INCLUDES_DIR.to_string(),
            layouts_dir: DEFAULT_LAYOUTS_DIR.to_string(),
            component_patterns: vec!["_*.html".to_string(), "_includes/**".to_string()],
            layout_patterns: vec![
                "_layout.html".to_string(),
                "_*.layout.html".to_string(),
                "_layouts/**".to_string(),
            ],
            default_layouts: Vec::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_css_import_depth: DEFAULT_MAX_CSS_IMPORT_DEPTH,
            max_parallel: None,
        }
    }
}

impl BuildConfig {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, has
    /// unknown keys, or contains an invalid glob.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| PagesmithError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `pagesmith.toml` from `project_root`, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists and fails to load.
    pub async fn load_or_default(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE_NAME);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, project_root.display());
            Ok(Self::default())
        }
    }

    /// Check every glob and numeric limit.
    ///
    /// # Errors
    ///
    /// Returns [`PagesmithError::InvalidPattern`] for the first bad glob, or
    /// [`PagesmithError::Other`] for a zero `max_parallel`.
    pub fn validate(&self) -> Result<(), PagesmithError> {
        let groups: [(&'static str, Vec<&str>); 3] = [
            ("component_patterns", self.component_patterns.iter().map(String::as_str).collect()),
            ("layout_patterns", self.layout_patterns.iter().map(String::as_str).collect()),
            ("default_layouts", self.default_layouts.iter().map(|r| r.pattern.as_str()).collect()),
        ];
        for (field, patterns) in groups {
            for pattern in patterns {
                Pattern::new(pattern).map_err(|e| PagesmithError::InvalidPattern {
                    field,
                    pattern: pattern.to_string(),
                    reason: e.msg.to_string(),
                })?;
            }
        }
        if self.max_parallel == Some(0) {
            return Err(PagesmithError::Other {
                message: "max_parallel must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Absolute source root for a project.
    #[must_use]
    pub fn source_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.source)
    }

    /// Absolute output root for a project.
    #[must_use]
    pub fn output_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output)
    }

    /// Concurrent compositions to run.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.max_parallel.unwrap_or_else(|| {
            std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(4)
        })
    }

    /// Whether `rel` (root-relative, `/`-separated) is a component.
    #[must_use]
    pub fn is_component(&self, rel: &str) -> bool {
        matches_any(&self.component_patterns, rel)
    }

    /// Whether `rel` is a layout.
    #[must_use]
    pub fn is_layout(&self, rel: &str) -> bool {
        matches_any(&self.layout_patterns, rel)
    }

    /// Whether `rel` should be composed into an output page.
    ///
    /// Pages are `.html`/`.htm` files that are neither components nor layouts
    /// and have no `_`-prefixed path segment.
    #[must_use]
    pub fn is_page_candidate(&self, rel: &str) -> bool {
        let lower = rel.to_ascii_lowercase();
        let is_html = lower.ends_with(".html") || lower.ends_with(".htm");
        is_html
            && !rel.split('/').any(|segment| segment.starts_with('_'))
            && !self.is_component(rel)
            && !self.is_layout(rel)
    }

    /// Layout named by the first default rule matching `rel`.
    #[must_use]
    pub fn default_layout_for(&self, rel: &str) -> Option<&str> {
        self.default_layouts
            .iter()
            .find(|rule| pattern_matches(&rule.pattern, rel))
            .map(|rule| rule.layout.as_str())
    }
}

fn pattern_matches(pattern: &str, rel: &str) -> bool {
    let Ok(compiled) = Pattern::new(pattern) else {
        return false;
    };
    if compiled.matches(rel) {
        return true;
    }
    !pattern.contains('/')
        && rel.rsplit('/').next().is_some_and(|file_name| compiled.matches(file_name))
}

fn matches_any(patterns: &[String], rel: &str) -> bool {
    patterns.iter().any(|pattern| pattern_matches(pattern, rel))
}
