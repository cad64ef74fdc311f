//! Pattern-level HTML helpers: attribute parsing and tag matching.
//!
//! These are deliberately not an HTML parser. They understand quoted attribute
//! values, self-closing tags and same-name nesting, which is enough for the
//! directives and head tags this crate rewrites.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Ordered attribute list as written. A `None` value is a boolean attribute.
pub type Attributes = Vec<(String, Option<String>)>;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid attribute regex")
});

/// Elements that never have a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse the attribute section of a start tag.
///
/// Accepts double-quoted, single-quoted, unquoted and boolean attributes.
/// Names are lowercased; values are kept verbatim.
///
/// ```rust
/// use pagesmith::extractor::markup::parse_attributes;
///
/// let attrs = parse_attributes(r#"rel=stylesheet href='a.css' data-x="1 2" defer"#);
/// assert_eq!(attrs[0], ("rel".to_string(), Some("stylesheet".to_string())));
/// assert_eq!(attrs[1].1.as_deref(), Some("a.css"));
/// assert_eq!(attrs[2].1.as_deref(), Some("1 2"));
/// assert_eq!(attrs[3], ("defer".to_string(), None));
/// ```
#[must_use]
pub fn parse_attributes(source: &str) -> Attributes {
    ATTRIBUTE
        .captures_iter(source)
        .filter_map(|cap| {
            let name = cap.get(1)?.as_str().to_ascii_lowercase();
            let value = cap.get(2).or_else(|| cap.get(3)).or_else(|| cap.get(4)).map(|m| m.as_str().to_string());
            Some((name, value))
        })
        .collect()
}

/// Case-insensitive attribute lookup. Boolean attributes yield `Some("")`.
#[must_use]
pub fn get_attribute<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_deref().unwrap_or(""))
}

/// Serialize attributes back to ` name="value"` form.
#[must_use]
pub fn render_attributes(attrs: &Attributes) -> String {
    let mut out = String::new();
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
    }
    out
}

/// Split a start tag such as `<link rel="x">` into its lowercase name and the
/// raw attribute text. Returns `None` for closing tags, comments and doctypes.
#[must_use]
pub fn split_start_tag(tag: &str) -> Option<(String, &str)> {
    let inner = tag.strip_prefix('<')?;
    let name_len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(inner.len());
    if name_len == 0 {
        return None;
    }
    let name = inner[..name_len].to_ascii_lowercase();
    let rest = inner[name_len..].trim_end_matches('>').trim_end_matches('/');
    Some((name, rest))
}

/// Byte index just past the `>` closing the tag that starts at `start`,
/// skipping `>` characters inside quoted attribute values.
#[must_use]
pub fn find_tag_end(html: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, byte) in html.as_bytes()[start..].iter().enumerate() {
        match (quote, byte) {
            (Some(q), b) if *b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(*byte),
            (None, b'>') => return Some(start + offset + 1),
            _ => {}
        }
    }
    None
}

fn is_name_boundary(bytes: &[u8], index: usize) -> bool {
    bytes.get(index).is_none_or(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
}

/// Locate the closing tag matching an element of type `name` whose start tag
/// ends at `from`. Nested elements of the same name are counted. Returns the
/// byte range of the closing tag itself.
#[must_use]
pub fn find_closing_tag(html: &str, from: usize, name: &str) -> Option<Range<usize>> {
    let lower = html.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let open = format!("<{}", name.to_ascii_lowercase());
    let close = format!("</{}", name.to_ascii_lowercase());

    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let next_close = lower[pos..].find(&close).map(|i| i + pos)?;
        let next_open = lower[pos..].find(&open).map(|i| i + pos).filter(|&o| o < next_close);

        if let Some(open_at) = next_open {
            if is_name_boundary(bytes, open_at + open.len()) {
                let end = find_tag_end(html, open_at)?;
                if !html[..end].ends_with("/>") {
                    depth += 1;
                }
                pos = end;
            } else {
                pos = open_at + open.len();
            }
            continue;
        }

        let end = find_tag_end(html, next_close)?;
        if is_name_boundary(bytes, next_close + close.len()) {
            depth -= 1;
            if depth == 0 {
                return Some(next_close..end);
            }
        }
        pos = end;
    }
}

/// Byte range of the whole element whose start tag spans `start_tag`.
///
/// Void and self-closing elements end with their start tag. An element whose
/// closing tag is missing also ends with its start tag.
#[must_use]
pub fn element_range(html: &str, start_tag: Range<usize>, name: &str) -> Range<usize> {
    let tag = &html[start_tag.clone()];
    if tag.ends_with("/>") || VOID_ELEMENTS.contains(&name) {
        return start_tag;
    }
    match find_closing_tag(html, start_tag.end, name) {
        Some(close) => start_tag.start..close.end,
        None => start_tag,
    }
}

/// Whether byte `index` of `html` falls inside an `<!-- … -->` comment.
#[must_use]
pub fn in_comment(html: &str, index: usize) -> bool {
    html[..index].rfind("<!--").is_some_and(|open| !html[open..index].contains("-->"))
}
