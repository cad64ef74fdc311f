//! Document structure: doctype, `<html>` attributes, head and body.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::extractor::markup::{Attributes, parse_attributes, render_attributes};

static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype\b[^>]*>").expect("valid doctype regex"));

static HTML_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<html\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("valid html regex")
});

static HTML_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</html\s*>").expect("valid html end regex"));

static HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<head\b(?:[^>"']|"[^"]*"|'[^']*')*>(.*?)</head\s*>"#).expect("valid head regex")
});

static BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<body\b(?:[^>"']|"[^"]*"|'[^']*')*>(.*)</body\s*>"#).expect("valid body regex")
});

static BODY_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("valid body end regex"));

/// Whether `content` is a full document rather than a fragment.
#[must_use]
pub fn is_full_document(content: &str) -> bool {
    HTML_START.is_match(content)
}

/// The parts of a page that take part in a layout merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub is_full: bool,
    pub doctype: Option<String>,
    /// Attributes of the `<html>` start tag, if there is one
    pub html_attrs: Option<Attributes>,
    /// Inner HTML of `<head>`, if there is one
    pub head: Option<String>,
    /// Content destined for slots: the `<body>` inner HTML, or whatever is
    /// left after the document scaffolding is removed
    pub body: String,
}

impl Document {
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let is_full = is_full_document(content);
        let doctype = DOCTYPE.find(content).map(|m| m.as_str().to_string());
        let html_attrs = HTML_START.captures(content).map(|cap| parse_attributes(&cap[1]));
        let head = HEAD.captures(content).map(|cap| cap[1].to_string());

        let body = if let Some(cap) = BODY.captures(content) {
            cap[1].to_string()
        } else {
            let mut rest = HEAD.replace(content, "").into_owned();
            if is_full {
                rest = DOCTYPE.replace(&rest, "").into_owned();
                rest = HTML_START.replace(&rest, "").into_owned();
                rest = HTML_END.replace(&rest, "").into_owned();
            }
            rest
        };

        Self {
            is_full,
            doctype,
            html_attrs,
            head,
            body,
        }
    }
}

/// Byte range of the `<head>` inner HTML in `content`.
#[must_use]
pub fn head_inner_range(content: &str) -> Option<Range<usize>> {
    HEAD.captures(content).and_then(|cap| cap.get(1)).map(|m| m.range())
}

/// Replace (or create) the `<head>` of `content` with `inner`.
///
/// Without an existing head, one is inserted after the `<html>` start tag, or
/// at the very start for fragments.
#[must_use]
pub fn replace_head(content: &str, inner: &str) -> String {
    if let Some(range) = head_inner_range(content) {
        return format!("{}\n{inner}\n{}", content[..range.start].trim_end(), content[range.end..].trim_start());
    }
    let head = format!("<head>\n{inner}\n</head>");
    match HTML_START.find(content) {
        Some(tag) => format!("{}\n{head}{}", &content[..tag.end()], &content[tag.end()..]),
        None => format!("{head}\n{content}"),
    }
}

/// Set the doctype of `content`, replacing any existing one.
#[must_use]
pub fn replace_doctype(content: &str, doctype: &str) -> String {
    match DOCTYPE.find(content) {
        Some(m) => format!("{}{doctype}{}", &content[..m.start()], &content[m.end()..]),
        None => format!("{doctype}\n{content}"),
    }
}

/// Union of two attribute lists; on a name collision `preferred` wins.
/// Order: `base` attributes first, then new ones from `preferred`.
#[must_use]
pub fn union_attributes(base: &Attributes, preferred: &Attributes) -> Attributes {
    let mut merged = base.clone();
    for (name, value) in preferred {
        match merged.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.clone(),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

/// Rewrite the `<html>` start tag of `content` with `attrs`. No-op without one.
#[must_use]
pub fn replace_html_attributes(content: &str, attrs: &Attributes) -> String {
    match HTML_START.find(content) {
        Some(tag) => format!(
            "{}<html{}>{}",
            &content[..tag.start()],
            render_attributes(attrs),
            &content[tag.end()..]
        ),
        None => content.to_string(),
    }
}

/// Insert `extra` just before the last `</body>`, or append it.
#[must_use]
pub fn append_to_body(content: &str, extra: &str) -> String {
    match BODY_END.find_iter(content).last() {
        Some(end) => format!("{}{extra}\n{}", &content[..end.start()], &content[end.start()..]),
        None => format!("{content}{extra}"),
    }
}
