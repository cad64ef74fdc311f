//! Security tables and checks for user-written references
//!
//! This module holds the deny-lists consulted by the path resolver: sensitive
//! system prefixes, dangerous URL schemes, executable extensions, and the
//! encoded-traversal tokens that show up in path injection attempts.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Absolute prefixes that a reference may never name, even though a leading `/`
/// is re-rooted under the source directory. A page asking for `/etc/passwd` is
/// treated as hostile rather than as `<root>/etc/passwd`.
pub static BLACKLISTED_PATHS: &[&str] = &[
    "/etc/",       // System configuration
    "/sys/",       // System information
    "/proc/",      // Process information
    "/dev/",       // Device files
    "/boot/",      // Boot files
    "/root/",      // Root home
    "/bin/",       // System binaries
    "/sbin/",      // System binaries
    "/usr/bin/",   // User binaries
    "/usr/sbin/",  // User system binaries
    "/var/log/",   // Log files
    "/System/",    // macOS system
    "/Library/",   // macOS system libraries
    "/private/",   // macOS private tree
    "/Windows/",   // Windows system, slash form
];

/// URL schemes that are never followed. Matched case-insensitively as substrings.
pub static DANGEROUS_SCHEMES: &[&str] = &[
    "javascript:",
    "vbscript:",
    "file:",
    "blob:",
    "mailto:",
    "tel:",
    "ftp:",
    "ws:",
    "wss:",
    "about:",
    "chrome:",
    "data:",
];

/// Executable or script extensions a static site never legitimately references.
pub static DANGEROUS_EXTENSIONS: &[&str] =
    &["exe", "bat", "cmd", "com", "scr", "msi", "dll", "ps1", "vbs", "jar", "sh"];

/// Tokens that indicate an encoded traversal or NUL injection.
///
/// Checked against the lowercased reference at every decoding level.
static ENCODED_TRAVERSAL_TOKENS: &[&str] = &[
    "%00",
    "%2e%2e",
    "%2e.",
    ".%2e",
    "%252e",
    "%25252e",
    "..%2f",
    "..%5c",
    "%2f..",
    "%5c..",
    "%c0%ae",
    "%c0%af",
    "%c1%9c",
    "%e0%80%ae",
    "%u002e",
    "%uff0e",
];

/// Unicode look-alikes of `.` and `/` used to sneak traversal past naive checks.
static UNICODE_TRAVERSAL_CHARS: &[char] = &[
    '\u{2024}', // one dot leader
    '\u{2025}', // two dot leader
    '\u{2026}', // horizontal ellipsis
    '\u{fe52}', // small full stop
    '\u{ff0e}', // fullwidth full stop
    '\u{2215}', // division slash
    '\u{2044}', // fraction slash
    '\u{ff0f}', // fullwidth solidus
    '\u{29f5}', // reverse solidus operator
    '\u{ff3c}', // fullwidth reverse solidus
];

// Only upload-style final extensions, and no two-letter inner extensions:
// `pl`, `sh` and friends double as language tags in names like `about.pl.html`.
static DOUBLE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\.(php\d?|phtml|asp|aspx|jsp|cgi|exe|bat|cmd)\.(png|jpe?g|gif|webp|avif|svg|ico|bmp|tiff?|pdf|txt|zip)$",
    )
    .expect("static regex")
});

/// Check if a path is blacklisted (points to sensitive system directories)
///
/// The check is a plain prefix match on the reference as written, using `/` separators.
///
/// # Examples
/// ```
/// use pagesmith::utils::security::is_path_blacklisted;
/// use std::path::Path;
///
/// assert!(is_path_blacklisted(Path::new("/etc/passwd")));
/// assert!(is_path_blacklisted(Path::new("/proc/self/environ")));
/// assert!(!is_path_blacklisted(Path::new("/assets/site.css")));
/// ```
#[must_use]
pub fn is_path_blacklisted(path: &Path) -> bool {
    let as_str = path.to_string_lossy().replace('\\', "/");
    BLACKLISTED_PATHS.iter().any(|prefix| {
        as_str.starts_with(prefix) || as_str == prefix.trim_end_matches('/')
    })
}

/// Returns the first dangerous scheme contained in `reference`, if any.
#[must_use]
pub fn dangerous_scheme(reference: &str) -> Option<&'static str> {
    let lower = reference.to_ascii_lowercase();
    DANGEROUS_SCHEMES.iter().copied().find(|scheme| lower.contains(scheme))
}

/// Whether `reference` carries an encoded traversal token, a NUL byte, or a
/// Unicode look-alike of a path separator or dot.
#[must_use]
pub fn has_encoded_traversal(reference: &str) -> bool {
    if reference.contains('\0') {
        return true;
    }
    if reference.chars().any(|c| UNICODE_TRAVERSAL_CHARS.contains(&c)) {
        return true;
    }
    let lower = reference.to_ascii_lowercase();
    ENCODED_TRAVERSAL_TOKENS.iter().any(|token| lower.contains(token))
}

/// Whether the final extension of `reference` is an executable type.
#[must_use]
pub fn has_dangerous_extension(reference: &str) -> bool {
    Path::new(reference)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DANGEROUS_EXTENSIONS.iter().any(|d| d.eq_ignore_ascii_case(ext)))
}

/// Whether `reference` hides a server-side or executable extension before the
/// real one, as in `shell.php.jpg`.
#[must_use]
pub fn has_double_extension(reference: &str) -> bool {
    DOUBLE_EXTENSION.is_match(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklisted_paths() {
        assert!(is_path_blacklisted(Path::new("/etc/passwd")));
        assert!(is_path_blacklisted(Path::new("/sys/kernel")));
        assert!(is_path_blacklisted(Path::new("/root/.ssh/id_rsa")));
        assert!(is_path_blacklisted(Path::new("/etc")));

        assert!(!is_path_blacklisted(Path::new("/assets/etc/logo.png")));
        assert!(!is_path_blacklisted(Path::new("/etcetera/page.html")));
        assert!(!is_path_blacklisted(Path::new("css/site.css")));
    }

    #[test]
    fn test_dangerous_scheme_is_case_insensitive() {
        assert_eq!(dangerous_scheme("JavaScript:alert(1)"), Some("javascript:"));
        assert_eq!(dangerous_scheme("  vbscript:msgbox"), Some("vbscript:"));
        assert_eq!(dangerous_scheme("MAILTO:me@example.com"), Some("mailto:"));
        assert_eq!(dangerous_scheme("images/photo.jpg"), None);
    }

    #[test]
    fn test_encoded_traversal_tokens() {
        assert!(has_encoded_traversal("%2e%2e/secret"));
        assert!(has_encoded_traversal("%2E%2E%2Fsecret"));
        assert!(has_encoded_traversal("file%00.css"));
        assert!(has_encoded_traversal("%252e%252e/x"));
        assert!(has_encoded_traversal("\u{ff0e}\u{ff0e}/x"));
        assert!(has_encoded_traversal("a\0b"));
        assert!(!has_encoded_traversal("my%20file.css"));
        assert!(!has_encoded_traversal("../shared/site.css"));
    }

    #[test]
    fn test_extensions() {
        assert!(has_dangerous_extension("tools/setup.exe"));
        assert!(has_dangerous_extension("run.PS1"));
        assert!(!has_dangerous_extension("site.css"));
        assert!(!has_dangerous_extension("README"));

        assert!(has_double_extension("upload/shell.php.jpg"));
        assert!(has_double_extension("x.ASP.png"));
        assert!(!has_double_extension("photo.min.jpg"));
        assert!(!has_double_extension("jquery.min.js"));
    }

    #[test]
    fn test_language_tags_are_not_double_extensions() {
        for name in ["about.pl.html", "index.sh.html", "news.py.htm", "kontakt.rb.html", "about.pl.png"] {
            assert!(!has_double_extension(name), "{name}");
        }
        assert!(!has_double_extension("page.php.html"));
    }
}
