//! Inline markers embedded in rich-text content.
//!
//! The text surface serializes annotation and reminder spans as elements
//! carrying `data-annotation-id` / `data-reminder-id` attributes. This module
//! turns that content into structured [`MarkerRef`]s so the rest of the crate
//! never pattern-matches on markup directly. Surfaces that keep a structured
//! document model override [`TextSurface::markers`] and skip the scan.

#[cfg(test)]
#[path = "markers_test.rs"]
mod markers_test;

use std::collections::BTreeSet;

const REMINDER_ATTR: &str = "data-reminder-id";
const ANNOTATION_ATTR: &str = "data-annotation-id";

/// What a marker links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    Annotation,
    Reminder,
}

impl MarkerKind {
    fn attribute(self) -> &'static str {
        match self {
            Self::Annotation => ANNOTATION_ATTR,
            Self::Reminder => REMINDER_ATTR,
        }
    }
}

/// A reference from text content to an annotation or reminder record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerRef {
    pub kind: MarkerKind,
    pub id: String,
}

/// A text-editing surface hosting one block's rich-text content.
pub trait TextSurface {
    /// Current serialized content.
    fn content(&self) -> String;

    /// Replace the characters in `from..to` with `text`.
    fn replace_range(&mut self, from: usize, to: usize, text: &str);

    /// Insert `text` at `at`.
    fn insert_at(&mut self, at: usize, text: &str) {
        self.replace_range(at, at, text);
    }

    /// Entity references embedded in the content, in document order.
    fn markers(&self) -> Vec<MarkerRef> {
        scan_markers(&self.content())
    }
}

/// Extract marker references from serialized content, in document order,
/// without duplicates.
#[must_use]
pub fn scan_markers(content: &str) -> Vec<MarkerRef> {
    let mut found: Vec<(usize, MarkerRef)> = Vec::new();
    for kind in [MarkerKind::Annotation, MarkerKind::Reminder] {
        for (offset, id) in attribute_values(content, kind.attribute()) {
            found.push((offset, MarkerRef { kind, id }));
        }
    }
    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = BTreeSet::new();
    found
        .into_iter()
        .map(|(_, m)| m)
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

/// All quoted values of `attr="..."` in `content`, with their byte offsets.
fn attribute_values(content: &str, attr: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut cursor = 0;
    while let Some(rel) = content[cursor..].find(attr) {
        let start = cursor + rel;
        cursor = start + attr.len();

        // Reject matches that are the tail of a longer attribute name.
        let preceded_ok = content[..start]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || c == '<' || c == '"' || c == '\'');
        if !preceded_ok {
            continue;
        }

        let rest = &content[cursor..];
        let Some(after_eq) = rest.trim_start().strip_prefix('=') else {
            continue;
        };
        let after_eq = after_eq.trim_start();
        let Some(quote) = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let value_src = &after_eq[quote.len_utf8()..];
        let Some(end) = value_src.find(quote) else {
            break;
        };
        let value = &value_src[..end];
        if !value.is_empty() {
            out.push((start, value.to_string()));
        }
    }
    out
}

/// Reminder ids present in `before` but missing from `after`.
#[must_use]
pub fn removed_reminders(before: &[MarkerRef], after: &[MarkerRef]) -> Vec<String> {
    let remaining: BTreeSet<&str> = after
        .iter()
        .filter(|m| m.kind == MarkerKind::Reminder)
        .map(|m| m.id.as_str())
        .collect();
    before
        .iter()
        .filter(|m| m.kind == MarkerKind::Reminder && !remaining.contains(m.id.as_str()))
        .map(|m| m.id.clone())
        .collect()
}

/// Span markup linking `text` to a reminder record.
#[must_use]
pub fn reminder_markup(id: &str, text: &str) -> String {
    format!(r#"<span {REMINDER_ATTR}="{}" class="reminder-tag">{}</span>"#, escape(id), escape(text))
}

/// Span markup linking `text` to an annotation record.
#[must_use]
pub fn annotation_markup(id: &str, text: &str) -> String {
    format!(r#"<span {ANNOTATION_ATTR}="{}" class="annotation-highlight">{}</span>"#, escape(id), escape(text))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
