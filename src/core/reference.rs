//! Reference and file-role types shared by the extractor, graph and compositor.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Stylesheet,
    Script,
    Image,
    Font,
    /// `<video>`, `<audio>` and `<source>` targets
    Media,
    /// `<object data=...>` targets
    Object,
    /// Anything matched by the extension allow-list fallback
    Generic,
}

impl ReferenceKind {
    /// Lowercase name used in logs and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stylesheet => "stylesheet",
            Self::Script => "script",
            Self::Image => "image",
            Self::Font => "font",
            Self::Media => "media",
            Self::Object => "object",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reference found in a source file.
///
/// `to` is `None` when the raw text was rejected by the resolver. Such a
/// reference is reported as a warning and never becomes a graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// File the reference was written in
    pub from: PathBuf,
    /// Resolved absolute target, if the raw text was safe
    pub to: Option<PathBuf>,
    pub kind: ReferenceKind,
    /// The reference exactly as written
    pub raw: String,
}

impl Reference {
    #[must_use]
    pub fn new(from: PathBuf, to: Option<PathBuf>, kind: ReferenceKind, raw: impl Into<String>) -> Self {
        Self {
            from,
            to,
            kind,
            raw: raw.into(),
        }
    }

    /// Whether the resolver accepted this reference.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.to.is_some()
    }
}

/// Role of a file, inferred from its position in the dependency graph.
///
/// A file with outgoing edges is a page; a file with incoming edges is a
/// dependency (include, layout or asset). A file can be both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Page,
    Dependency,
    Both,
    /// Not present in the graph at all
    Unknown,
}

impl FileRole {
    #[must_use]
    pub const fn from_edges(has_outgoing: bool, has_incoming: bool) -> Self {
        match (has_outgoing, has_incoming) {
            (true, true) => Self::Both,
            (true, false) => Self::Page,
            (false, true) => Self::Dependency,
            (false, false) => Self::Unknown,
        }
    }
}
