// src/locator.rs
//! Finding a field's question by the best signal the page offers

use crate::types::{FieldLocator, FieldSignals};

/// Collapse whitespace and drop empty lines.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `job_application[first_name]` -> `first name`, `phoneNumber` -> `phone number`
pub fn humanize_name(name: &str) -> String {
    let segment = name
        .split(['[', ']'])
        .filter(|s| !s.is_empty() && !s.chars().all(|c| c.is_ascii_digit()))
        .last()
        .unwrap_or(name);

    let mut spaced = String::with_capacity(segment.len() + 4);
    let mut previous_lower = false;
    for c in segment.chars() {
        if c.is_uppercase() && previous_lower {
            spaced.push(' ');
        }
        previous_lower = c.is_lowercase() || c.is_ascii_digit();
        match c {
            '_' | '-' | '.' => spaced.push(' '),
            c => spaced.extend(c.to_lowercase()),
        }
    }

    clean_text(&spaced)
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(clean_text)
        .filter(|v| !v.is_empty())
}

/// Question text from the first non-empty signal: label, aria-label,
/// placeholder, then the humanised name or id.
pub fn question_text(signals: &FieldSignals) -> Option<String> {
    present(&signals.label)
        .map(|label| label.trim_end_matches('*').trim().to_string())
        .filter(|label| !label.is_empty())
        .or_else(|| present(&signals.aria_label))
        .or_else(|| present(&signals.placeholder))
        .or_else(|| present(&signals.name).map(|n| humanize_name(&n)))
        .or_else(|| present(&signals.id).map(|id| humanize_name(&id)))
        .filter(|text| !text.is_empty())
}

fn is_css_ident(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn quote_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// CSS selector that finds the field again: by id when it has one, else by name.
pub fn selector_for(tag: &str, signals: &FieldSignals) -> Option<String> {
    if let Some(id) = present(&signals.id) {
        return Some(if is_css_ident(&id) {
            format!("#{}", id)
        } else {
            format!("{}[id=\"{}\"]", tag, quote_attr(&id))
        });
    }
    present(&signals.name).map(|name| format!("{}[name=\"{}\"]", tag, quote_attr(&name)))
}

pub fn locate(tag: &str, signals: FieldSignals) -> FieldLocator {
    FieldLocator {
        selector: selector_for(tag, &signals),
        signals,
    }
}
