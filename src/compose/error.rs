use serde::Serialize;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A failure that aborts one page's composition.
///
/// These never abort a whole build; the orchestrator records them against
/// the page and carries on with the others.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// An include or layout directive led back to a file already being composed
    #[error("Circular dependency detected: {}", render_cycle(chain, target))]
    CircularDependency {
        /// Files on the composition stack, outermost first
        chain: Vec<PathBuf>,
        /// The file whose inclusion closed the loop
        target: PathBuf,
    },

    /// A directive that cannot be interpreted, such as two `data-layout` attributes on a fragment
    #[error("Malformed directive in {}: {message}", path.display())]
    MalformedDirective {
        path: PathBuf,
        message: String,
    },

    /// A file that exists could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Report category for a failed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FatalKind {
    CircularDependency,
    MalformedDirective,
    Read,
}

impl ComposeError {
    #[must_use]
    pub const fn kind(&self) -> FatalKind {
        match self {
            Self::CircularDependency {
                ..
            } => FatalKind::CircularDependency,
            Self::MalformedDirective {
                ..
            } => FatalKind::MalformedDirective,
            Self::Read {
                ..
            } => FatalKind::Read,
        }
    }

    /// Multi-line rendering of a cycle for error details; empty for other variants.
    #[must_use]
    pub fn format_chain(&self) -> String {
        let Self::CircularDependency {
            chain,
            target,
        } = self
        else {
            return String::new();
        };

        let mut out = String::new();
        for (i, file) in chain.iter().enumerate() {
            let arrow = if i == 0 {
                "  "
            } else {
                "→ "
            };
            let _ = writeln!(out, "{arrow}{}", file.display());
        }
        let _ = write!(out, "→ {} (already being composed)", target.display());
        out
    }
}

fn render_cycle(chain: &[PathBuf], target: &Path) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .chain(std::iter::once(target.display().to_string()))
        .collect::<Vec<_>>()
        .join(" → ")
}
