//! `<head>` merging with per-tag deduplication.
//!
//! Fragments are given outermost layout first and page last. Conflicts are
//! settled per element type:
//!
//! | Element | Key | Winner |
//! |---|---|---|
//! | `<title>`, `<base>` | element name | last |
//! | `<meta name>` / `<meta property>` | attribute kind and value | last |
//! | `<link href>` | `rel` and `href` | first, unless the later one has `data-allow-duplicate` |
//! | `<script src>` | `src` | first, unless the later one has `data-allow-duplicate` |
//! | anything else | none | all kept in order |
//!
//! A last-wins element keeps the position of its first occurrence.

use std::collections::{HashMap, HashSet};

use crate::extractor::markup::{element_range, find_tag_end, get_attribute, parse_attributes, split_start_tag};

/// One `<head>` body and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadFragment {
    /// Label for logs, usually the source path
    pub source: String,
    /// Inner HTML of a `<head>` element
    pub html: String,
}

impl HeadFragment {
    pub fn new(source: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            html: html.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Policy {
    LastWins(String),
    FirstWins {
        key: String,
        allow_duplicate: bool,
    },
    Keep,
}

/// Merge head fragments into one deduplicated fragment, one element per line.
///
/// Blank fragments are skipped.
///
/// ```rust
/// use pagesmith::compose::{HeadFragment, merge_head};
///
/// let merged = merge_head(&[
///     HeadFragment::new("layout", r#"<title>Site</title><link rel="stylesheet" href="base.css">"#),
///     HeadFragment::new("page", r#"<title>Page</title><link rel="stylesheet" href="base.css">"#),
/// ]);
/// assert_eq!(merged, "<title>Page</title>\n<link rel=\"stylesheet\" href=\"base.css\">");
/// ```
#[must_use]
pub fn merge_head(fragments: &[HeadFragment]) -> String {
    let mut merged: Vec<&str> = Vec::new();
    let mut last_wins: HashMap<String, usize> = HashMap::new();
    let mut first_wins: HashSet<String> = HashSet::new();

    for fragment in fragments.iter().filter(|f| !f.html.trim().is_empty()) {
        for item in split_head_items(&fragment.html) {
            match classify(item) {
                Policy::LastWins(key) => match last_wins.get(&key) {
                    Some(&index) => merged[index] = item,
                    None => {
                        last_wins.insert(key, merged.len());
                        merged.push(item);
                    }
                },
                Policy::FirstWins {
                    key,
                    allow_duplicate,
                } => {
                    if first_wins.insert(key) || allow_duplicate {
                        merged.push(item);
                    } else {
                        tracing::trace!("Dropping duplicate head element from {}: {item}", fragment.source);
                    }
                }
                Policy::Keep => merged.push(item),
            }
        }
    }

    merged.join("\n")
}

/// Split head HTML into top-level elements, comments and non-blank text runs.
fn split_head_items(html: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(offset) = html[pos..].find('<') else {
            push_text(&mut items, &html[pos..]);
            break;
        };
        let start = pos + offset;
        push_text(&mut items, &html[pos..start]);

        if html[start..].starts_with("<!--") {
            let end = html[start..].find("-->").map_or(html.len(), |i| start + i + 3);
            items.push(&html[start..end]);
            pos = end;
            continue;
        }

        let Some(tag_end) = find_tag_end(html, start) else {
            push_text(&mut items, &html[start..]);
            break;
        };
        match split_start_tag(&html[start..tag_end]) {
            Some((name, _)) => {
                let range = element_range(html, start..tag_end, &name);
                pos = range.end;
                items.push(&html[range]);
            }
            // Stray closing tags and doctypes have no place in a head
            None => pos = tag_end,
        }
    }

    items
}

fn push_text<'a>(items: &mut Vec<&'a str>, text: &'a str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        items.push(trimmed);
    }
}

fn classify(item: &str) -> Policy {
    let Some((name, attr_source)) =
        find_tag_end(item, 0).and_then(|end| split_start_tag(&item[..end]))
    else {
        return Policy::Keep;
    };
    let attrs = parse_attributes(attr_source);

    match name.as_str() {
        "title" | "base" => Policy::LastWins(name),
        "meta" => {
            if let Some(value) = get_attribute(&attrs, "name") {
                Policy::LastWins(format!("meta:name:{}", value.to_ascii_lowercase()))
            } else if let Some(value) = get_attribute(&attrs, "property") {
                Policy::LastWins(format!("meta:property:{}", value.to_ascii_lowercase()))
            } else {
                Policy::Keep
            }
        }
        "link" => match get_attribute(&attrs, "href") {
            Some(href) => Policy::FirstWins {
                key: format!(
                    "link:{}:{href}",
                    get_attribute(&attrs, "rel").unwrap_or_default().to_ascii_lowercase()
                ),
                allow_duplicate: get_attribute(&attrs, "data-allow-duplicate").is_some(),
            },
            None => Policy::Keep,
        },
        "script" => match get_attribute(&attrs, "src") {
            Some(src) => Policy::FirstWins {
                key: format!("script:{src}"),
                allow_duplicate: get_attribute(&attrs, "data-allow-duplicate").is_some(),
            },
            None => Policy::Keep,
        },
        _ => Policy::Keep,
    }
}
