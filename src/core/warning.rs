//! Non-fatal composition diagnostics.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Category of a recoverable problem. None of these stop a page from composing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// The resolver rejected a reference as unsafe
    SecurityViolation,
    /// A reference resolved to a file that does not exist
    MissingReference,
    /// Include nesting hit the depth limit and expansion stopped
    DepthExceeded,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SecurityViolation => "security violation",
            Self::MissingReference => "missing reference",
            Self::DepthExceeded => "depth exceeded",
        })
    }
}

/// A warning attached to one composed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// File in which the offending reference was written
    pub file: PathBuf,
    /// The reference as written
    pub reference: String,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(
        kind: WarningKind,
        file: impl Into<PathBuf>,
        reference: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            file: file.into(),
            reference: reference.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.kind, self.file.display(), self.message)
    }
}
