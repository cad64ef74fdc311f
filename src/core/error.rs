//! Error handling for pagesmith
//!
//! Two layers, as in the rest of the crate:
//! - [`PagesmithError`] - typed failures of configuration, discovery and I/O
//! - [`ErrorContext`] - a wrapper adding a suggestion and details for CLI output
//!
//! Composition failures have their own type, [`crate::compose::ComposeError`],
//! because they are scoped to one page and collected into build reports rather
//! than propagated. [`user_friendly_error`] understands both.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagesmith::core::{PagesmithError, ErrorContext};
//!
//! let context = ErrorContext::new(PagesmithError::SourceRootMissing {
//!     path: "site/src".into(),
//! })
//! .with_suggestion("Create the directory or point --root at your site");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::compose::ComposeError;

/// The main error type for pagesmith operations outside a single page composition.
#[derive(Error, Debug)]
pub enum PagesmithError {
    /// The configured source directory does not exist
    #[error("Source directory not found: {}", path.display())]
    SourceRootMissing {
        path: PathBuf,
    },

    /// `pagesmith.toml` could not be parsed
    #[error("Invalid configuration in {}: {reason}", path.display())]
    ConfigParse {
        path: PathBuf,
        reason: String,
    },

    /// A glob in the configuration does not compile
    #[error("Invalid pattern '{pattern}' in {field}: {reason}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        reason: String,
    },

    /// One or more pages failed, or warnings were promoted by `--fail-on`
    #[error("Build failed: {fatal} page(s) failed, {warnings} warning(s)")]
    BuildFailed {
        fatal: usize,
        warnings: usize,
    },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else
    #[error("{message}")]
    Other {
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error, already rendered
    pub error: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from any displayable error.
    #[must_use]
    pub fn new(error: impl fmt::Display) -> Self {
        Self {
            error: error.to_string(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(err) = error.downcast_ref::<PagesmithError>() {
        return match err {
            PagesmithError::SourceRootMissing {
                ..
            } => ErrorContext::new(err)
                .with_suggestion("Check --root and the `source` key in pagesmith.toml"),
            PagesmithError::ConfigParse {
                ..
            } => ErrorContext::new(err)
                .with_suggestion("Fix the TOML syntax or delete pagesmith.toml to use defaults"),
            PagesmithError::InvalidPattern {
                ..
            } => ErrorContext::new(err)
                .with_suggestion("Patterns use glob syntax, e.g. `blog/**` or `_*.html`"),
            PagesmithError::BuildFailed {
                ..
            } => ErrorContext::new(err)
                .with_suggestion("Re-run with --verbose to see every warning, or relax --fail-on"),
            _ => ErrorContext::new(err),
        };
    }

    if let Some(err) = error.downcast_ref::<ComposeError>() {
        return match err {
            ComposeError::CircularDependency {
                ..
            } => ErrorContext::new(err)
                .with_suggestion("Remove one of the include or layout directives in the cycle")
                .with_details(err.format_chain()),
            ComposeError::MalformedDirective {
                ..
            } => ErrorContext::new(err)
                .with_suggestion("A fragment may carry a single data-layout attribute on its root element"),
            ComposeError::Read {
                ..
            } => ErrorContext::new(err).with_suggestion("Check file permissions and encoding (UTF-8)"),
        };
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(message)
}
