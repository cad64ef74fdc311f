//! Include and layout directive scanning.
//!
//! Recognised syntax:
//!
//! - `<!--#include file="X"-->` and `<!--#include virtual="X"-->`
//! - `<include src="X"/>` and `<include src="X">…</include>`
//! - `<link rel="layout" href="X">`
//! - `data-layout="X"` on any element

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::markup::{find_closing_tag, get_attribute, in_comment, parse_attributes};

static SSI_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<!--#include\s+(file|virtual)\s*=\s*(?:"([^"]*)"|'([^']*)')\s*-->"#)
        .expect("valid ssi regex")
});

static INCLUDE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<include\b((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#)
        .expect("valid include regex")
});

static LINK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("valid link regex")
});

static DATA_LAYOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+data-layout\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid data-layout regex")
});

/// Which syntax an include was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeSyntax {
    SsiFile,
    SsiVirtual,
    Element,
}

/// One include directive and the byte span it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Span replaced by the expanded content, body included
    pub span: Range<usize>,
    pub src: String,
    pub syntax: IncludeSyntax,
    /// Children of `<include src="X">…</include>`
    pub body: Option<String>,
}

/// A `<link rel="layout">` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLink {
    pub span: Range<usize>,
    pub href: String,
}

/// One `data-layout` attribute. The span covers the attribute and its
/// leading whitespace so that removing it leaves a well-formed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub span: Range<usize>,
    pub value: String,
}

/// All layout directives found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutDirectives {
    pub link: Option<LayoutLink>,
    pub data_layouts: Vec<DataLayout>,
}

/// Find every top-level include directive, in document order.
///
/// Directives nested inside an `<include>` body are not returned; they belong
/// to the body and are expanded with it. `<include>` elements inside comments
/// are left alone.
pub fn find_includes(html: &str) -> Vec<IncludeDirective> {
    let mut found = Vec::new();

    for cap in SSI_INCLUDE.captures_iter(html) {
        let Some(whole) = cap.get(0) else { continue };
        let syntax = if cap[1].eq_ignore_ascii_case("virtual") {
            IncludeSyntax::SsiVirtual
        } else {
            IncludeSyntax::SsiFile
        };
        let src = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
        found.push(IncludeDirective {
            span: whole.range(),
            src: src.to_string(),
            syntax,
            body: None,
        });
    }

    for cap in INCLUDE_ELEMENT.captures_iter(html) {
        let Some(tag) = cap.get(0) else { continue };
        if in_comment(html, tag.start()) {
            continue;
        }
        let attrs = parse_attributes(&cap[1]);
        let src = get_attribute(&attrs, "src").unwrap_or_default().to_string();

        let self_closing = !cap[2].is_empty();
        let (span, body) = if self_closing {
            (tag.range(), None)
        } else {
            match find_closing_tag(html, tag.end(), "include") {
                Some(close) => (
                    tag.start()..close.end,
                    Some(html[tag.end()..close.start].to_string()),
                ),
                None => (tag.range(), None),
            }
        };
        found.push(IncludeDirective {
            span,
            src,
            syntax: IncludeSyntax::Element,
            body,
        });
    }

    found.sort_by_key(|d| d.span.start);
    let mut top_level: Vec<IncludeDirective> = Vec::with_capacity(found.len());
    for directive in found {
        let nested = top_level.last().is_some_and(|outer| directive.span.start < outer.span.end);
        if !nested {
            top_level.push(directive);
        }
    }
    top_level
}

/// Find the first `<link rel="layout" href>` and every `data-layout` attribute.
pub fn find_layout_directives(html: &str) -> LayoutDirectives {
    let link = LINK_TAG.captures_iter(html).find_map(|cap| {
        let attrs = parse_attributes(&cap[1]);
        let rel = get_attribute(&attrs, "rel")?;
        if !rel.trim().eq_ignore_ascii_case("layout") {
            return None;
        }
        let href = get_attribute(&attrs, "href")?.trim();
        Some(LayoutLink {
            span: cap.get(0)?.range(),
            href: href.to_string(),
        })
    });

    let data_layouts = DATA_LAYOUT
        .captures_iter(html)
        .filter_map(|cap| {
            let value = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3))?;
            Some(DataLayout {
                span: cap.get(0)?.range(),
                value: value.as_str().trim().to_string(),
            })
        })
        .collect();

    LayoutDirectives {
        link,
        data_layouts,
    }
}
