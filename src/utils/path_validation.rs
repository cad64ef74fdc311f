//! Reference resolution and path validation.
//!
//! Every path a page, include, layout or stylesheet mentions goes through
//! [`resolve_reference`] before it is read or recorded. The function is pure:
//! it decides from the reference text, the referencing file and the source root
//! alone, performs no I/O and never panics. Rejections are logged and surface as
//! `None`; [`check_reference`] exposes the reason for callers that report it.
//!
//! Resolution rules:
//! - a leading `/` is rooted at the source root
//! - anything else is relative to the referencing file's directory
//! - `?query` and `#fragment` suffixes are dropped
//! - the normalized result must be the source root or lie beneath it

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::fs::normalize_path;
use super::security;

/// Maximum number of nested percent-decoding passes inspected for hidden traversal.
pub const MAX_DECODE_LEVELS: usize = 3;

/// Why a reference was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathRejection {
    #[error("empty reference")]
    Empty,
    #[error("fragment-only reference")]
    FragmentOnly,
    #[error("data URL")]
    DataUrl,
    #[error("external or protocol-relative URL")]
    External,
    #[error("dangerous scheme '{0}'")]
    DangerousScheme(&'static str),
    #[error("UNC path")]
    UncPath,
    #[error("Windows drive letter")]
    DriveLetter,
    #[error("sensitive system path")]
    SensitivePath,
    #[error("NUL byte")]
    NullByte,
    #[error("encoded traversal sequence")]
    EncodedTraversal,
    #[error("directory traversal")]
    Traversal,
    #[error("executable extension")]
    DangerousExtension,
    #[error("suspicious double extension")]
    DoubleExtension,
    #[error("resolves outside the source root")]
    OutsideRoot,
}

impl PathRejection {
    /// Whether this rejection indicates a hostile or unsafe reference, as opposed
    /// to one that is simply not a local file (external URL, empty, fragment).
    #[must_use]
    pub const fn is_security_violation(self) -> bool {
        !matches!(self, Self::Empty | Self::FragmentOnly | Self::DataUrl | Self::External)
    }
}

/// Whether `raw` names something outside the local tree that extractors skip
/// before resolution: absolute or protocol-relative URLs, data URLs,
/// `mailto:`/`tel:` links and fragment-only anchors.
#[must_use]
pub fn is_external_reference(raw: &str) -> bool {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || lower.contains("://")
        || lower.starts_with("data:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
}

/// Resolve a user-written reference to an absolute path inside `source_root`.
///
/// Returns `None` for anything unsafe or non-local. Security rejections are
/// logged at `warn`, benign ones (external URLs, empty strings) at `debug`.
///
/// # Examples
///
/// ```rust
/// use pagesmith::utils::path_validation::resolve_reference;
/// use std::path::{Path, PathBuf};
///
/// let root = Path::new("/src");
/// let page = Path::new("/src/index.html");
///
/// assert_eq!(
///     resolve_reference("assets/a.css", page, root),
///     Some(PathBuf::from("/src/assets/a.css"))
/// );
/// assert_eq!(resolve_reference("../../etc/passwd", page, root), None);
/// ```
#[must_use]
pub fn resolve_reference(raw: &str, referencing: &Path, source_root: &Path) -> Option<PathBuf> {
    match check_reference(raw, referencing, source_root) {
        Ok(path) => Some(path),
        Err(rejection) if rejection.is_security_violation() => {
            tracing::warn!(
                "Rejected reference '{}' in {}: {}",
                raw,
                referencing.display(),
                rejection
            );
            None
        }
        Err(rejection) => {
            tracing::debug!("Skipped reference '{}' in {}: {}", raw, referencing.display(), rejection);
            None
        }
    }
}

/// Same as [`resolve_reference`] but reports the reason for a rejection and logs nothing.
pub fn check_reference(
    raw: &str,
    referencing: &Path,
    source_root: &Path,
) -> Result<PathBuf, PathRejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathRejection::Empty);
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("data:") {
        return Err(PathRejection::DataUrl);
    }
    if trimmed.starts_with("\\\\") {
        return Err(PathRejection::UncPath);
    }
    if trimmed.starts_with("//") || lower.contains("://") {
        return Err(PathRejection::External);
    }
    if let Some(scheme) = security::dangerous_scheme(trimmed) {
        return Err(PathRejection::DangerousScheme(scheme));
    }
    if has_drive_letter(trimmed) {
        return Err(PathRejection::DriveLetter);
    }

    let path_part = strip_query_and_fragment(trimmed);
    if path_part.is_empty() {
        return Err(PathRejection::FragmentOnly);
    }

    let decoded = decode_checked(path_part)?;
    let decoded = decoded.replace('\\', "/");

    if decoded.starts_with("//") {
        return Err(PathRejection::UncPath);
    }
    if has_drive_letter(&decoded) {
        return Err(PathRejection::DriveLetter);
    }
    if decoded.starts_with('/') && security::is_path_blacklisted(Path::new(&decoded)) {
        return Err(PathRejection::SensitivePath);
    }
    if has_literal_traversal(&decoded) {
        return Err(PathRejection::Traversal);
    }
    if security::has_double_extension(&decoded) {
        return Err(PathRejection::DoubleExtension);
    }
    if security::has_dangerous_extension(&decoded) {
        return Err(PathRejection::DangerousExtension);
    }

    let joined = if let Some(rooted) = decoded.strip_prefix('/') {
        source_root.join(rooted.trim_start_matches('/'))
    } else {
        referencing.parent().unwrap_or(source_root).join(&decoded)
    };

    let resolved = normalize_path(&joined);
    let root = normalize_path(source_root);
    if resolved == root || resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(PathRejection::OutsideRoot)
    }
}

/// Percent-decodes up to [`MAX_DECODE_LEVELS`] times, inspecting every level.
fn decode_checked(path: &str) -> Result<String, PathRejection> {
    let mut current = path.to_string();

    for level in 0..=MAX_DECODE_LEVELS {
        if current.contains('\0') || current.to_ascii_lowercase().contains("%00") {
            return Err(PathRejection::NullByte);
        }
        if security::has_encoded_traversal(&current) {
            return Err(PathRejection::EncodedTraversal);
        }
        if level == MAX_DECODE_LEVELS || !current.contains('%') {
            break;
        }

        let bytes = urlencoding::decode_binary(current.as_bytes());
        let decoded = String::from_utf8_lossy(&bytes).into_owned();
        if decoded == current {
            break;
        }
        current = decoded;
    }

    Ok(current)
}

fn strip_query_and_fragment(reference: &str) -> &str {
    match reference.find(['?', '#']) {
        Some(index) => &reference[..index],
        None => reference,
    }
}

fn has_drive_letter(reference: &str) -> bool {
    let bytes = reference.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// `..` on its own, a trailing `/..`, a segment of three or more dots, or `..`
/// padded with trailing whitespace.
fn has_literal_traversal(reference: &str) -> bool {
    if reference == ".." || reference.ends_with("/..") {
        return true;
    }
    reference.split('/').any(|segment| {
        let trimmed = segment.trim_end_matches([' ', '\t']);
        (trimmed.len() >= 3 && trimmed.chars().all(|c| c == '.'))
            || (trimmed == ".." && segment != "..")
    })
}
