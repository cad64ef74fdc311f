//! Slot bindings and slot filling.
//!
//! Content handed to a layout or component is split into named bindings and
//! a default binding:
//!
//! - `<any data-slot="name">…</any>` binds the whole element, minus the
//!   `data-slot` attribute, to `name`
//! - `<template target="name">…</template>` binds the template's children
//! - `<template>` without a target and unmarked content go to the default slot
//!
//! Several elements bound to the same name are concatenated in order.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::extractor::markup::{element_range, find_closing_tag, get_attribute, in_comment, parse_attributes};

static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<([a-z][a-z0-9-]*)\b((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#)
        .expect("valid start tag regex")
});

static DATA_SLOT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+data-slot\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+)"#)
        .expect("valid data-slot regex")
});

/// Content split by slot name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotBindings {
    pub named: HashMap<String, String>,
    /// Unmarked content, `None` when it is only whitespace
    pub default: Option<String>,
}

impl SlotBindings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.default.is_none()
    }

    fn bind(&mut self, name: &str, content: &str) {
        self.named.entry(name.to_string()).or_default().push_str(content);
    }
}

/// Split `content` into slot bindings.
#[must_use]
pub fn split_bindings(content: &str) -> SlotBindings {
    let mut bindings = SlotBindings::default();
    let mut default = String::new();
    let mut pos = 0;

    while let Some(cap) = START_TAG.captures_at(content, pos) {
        let Some(tag) = cap.get(0) else { break };
        if in_comment(content, tag.start()) {
            default.push_str(&content[pos..tag.end()]);
            pos = tag.end();
            continue;
        }

        let name = cap[1].to_ascii_lowercase();
        let attrs = parse_attributes(&cap[2]);

        if name == "template" {
            let close = if cap[3].is_empty() {
                find_closing_tag(content, tag.end(), "template")
            } else {
                None
            };
            let (inner, end) = match close {
                Some(close) => (&content[tag.end()..close.start], close.end),
                None => ("", tag.end()),
            };
            default.push_str(&content[pos..tag.start()]);
            match get_attribute(&attrs, "target").map(str::trim).filter(|t| !t.is_empty()) {
                Some(target) => bindings.bind(target, inner),
                None => default.push_str(inner),
            }
            pos = end;
            continue;
        }

        let Some(slot) = get_attribute(&attrs, "data-slot").map(str::trim).filter(|s| !s.is_empty())
        else {
            // Not a binding; keep scanning inside it
            default.push_str(&content[pos..tag.end()]);
            pos = tag.end();
            continue;
        };

        let range = element_range(content, tag.range(), &name);
        let start_tag = DATA_SLOT_ATTR.replace(tag.as_str(), "");
        let element = format!("{start_tag}{}", &content[tag.end()..range.end.max(tag.end())]);
        default.push_str(&content[pos..tag.start()]);
        bindings.bind(slot, &element);
        pos = range.end;
    }
    default.push_str(&content[pos..]);

    if !default.trim().is_empty() {
        bindings.default = Some(default);
    }
    bindings
}

/// Replace `<slot>` placeholders in `template` with `bindings`.
///
/// Named slots take the matching binding or keep their own children as a
/// fallback. The first unnamed slot takes the default binding; further
/// unnamed slots keep their fallback. Default content with nowhere to go is
/// appended before `</body>`.
#[must_use]
pub fn fill_slots(template: &str, bindings: &SlotBindings) -> String {
    let mut default_used = false;
    let out = fill_into(template, bindings, &mut default_used);

    match (&bindings.default, default_used) {
        (Some(default), false) => super::document::append_to_body(&out, default),
        _ => out,
    }
}

fn fill_into(template: &str, bindings: &SlotBindings, default_used: &mut bool) -> String {
    let mut out = String::with_capacity(template.len());
    let mut pos = 0;

    while let Some(cap) = START_TAG.captures_at(template, pos) {
        let Some(tag) = cap.get(0) else { break };
        let is_slot = cap[1].eq_ignore_ascii_case("slot") && !in_comment(template, tag.start());
        if !is_slot {
            out.push_str(&template[pos..tag.end()]);
            pos = tag.end();
            continue;
        }

        let (fallback, end) = if cap[3].is_empty() {
            match find_closing_tag(template, tag.end(), "slot") {
                Some(close) => (&template[tag.end()..close.start], close.end),
                None => ("", tag.end()),
            }
        } else {
            ("", tag.end())
        };

        out.push_str(&template[pos..tag.start()]);
        let attrs = parse_attributes(&cap[2]);
        let name = get_attribute(&attrs, "name").map(str::trim).filter(|n| !n.is_empty());
        let replacement = match name {
            Some(name) => bindings.named.get(name).map(String::as_str),
            None if !*default_used => {
                *default_used = true;
                bindings.default.as_deref()
            }
            None => None,
        };
        match replacement {
            Some(content) => out.push_str(content),
            // Fallbacks may hold slots of their own
            None => out.push_str(&fill_into(fallback, bindings, default_used)),
        }
        pos = end;
    }
    out.push_str(&template[pos..]);
    out
}
