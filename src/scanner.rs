// src/scanner.rs
//! Turns an application page's HTML into form questions and buttons

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::locator::{clean_text, locate, question_text, selector_for};
use crate::types::{FieldSignals, FormQuestion, InputKind, PageButton, PageField, PageSnapshot};

const IGNORED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image", "search"];

// Wrappers that ATS forms put around one question and its label.
const QUESTION_BLOCK_CLASSES: &[&str] = &[
    "application-question",
    "field",
    "question",
    "form-group",
    "job-application-question",
    "jobs-easy-apply-form-section__grouping",
    "fb-dash-form-element",
];

const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormScan {
    pub title: String,
    pub fields: Vec<PageField>,
    pub buttons: Vec<PageButton>,
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))
}

fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn attr(element: ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn ancestor_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.ancestors().filter_map(ElementRef::wrap)
}

fn wrapping_label(element: ElementRef) -> Option<String> {
    ancestor_elements(element)
        .take_while(|a| a.value().name() != "form")
        .find(|a| a.value().name() == "label")
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Label of the question block around `element`: a fieldset legend, or the
/// first label in the block that does not wrap an input of its own.
fn block_label(element: ElementRef<'_>, inputs: &Selector, labels: &Selector) -> Option<String> {
    for ancestor in ancestor_elements(element) {
        let name = ancestor.value().name();
        if name == "form" || name == "body" {
            break;
        }

        let is_fieldset = name == "fieldset";
        let is_block = ancestor
            .value()
            .classes()
            .any(|c| QUESTION_BLOCK_CLASSES.contains(&c));
        if !is_fieldset && !is_block {
            continue;
        }

        let found = ancestor
            .select(labels)
            .find(|label| label.select(inputs).next().is_none())
            .map(element_text)
            .filter(|t| !t.is_empty());
        if found.is_some() {
            return found;
        }
    }
    None
}

fn input_kind(tag: &str, input_type: &str) -> InputKind {
    match (tag, input_type) {
        ("textarea", _) => InputKind::MultiLineText,
        ("select", _) => InputKind::Dropdown,
        (_, "radio") => InputKind::SingleChoice,
        (_, "checkbox") => InputKind::Checkbox,
        (_, "file") => InputKind::File,
        _ => InputKind::ShortText,
    }
}

fn is_required(element: ElementRef, label: Option<&str>) -> bool {
    element.value().attr("required").is_some()
        || element.value().attr("aria-required") == Some("true")
        || label.map(|l| l.trim_end().ends_with('*')).unwrap_or(false)
}

pub fn scan_document(html: &str) -> Result<FormScan> {
    let document = Html::parse_document(html);

    let label_for = selector("label[for]")?;
    let fields_sel = selector("input, textarea, select")?;
    let option_sel = selector("option")?;
    let inputs_sel = selector("input, textarea, select")?;
    let labels_sel = selector("legend, label, .label, .question-label, .field-label")?;
    let buttons_sel = selector("button, input[type='submit'], input[type='button'], a[href]")?;
    let title_sel = selector("title")?;

    let mut labels: HashMap<String, String> = HashMap::new();
    for label in document.select(&label_for) {
        if let Some(target) = label.value().attr("for") {
            let text = element_text(label);
            if !text.is_empty() {
                labels.entry(target.to_string()).or_insert(text);
            }
        }
    }

    let mut fields: Vec<PageField> = Vec::new();
    let mut radio_groups: HashMap<String, usize> = HashMap::new();

    for element in document.select(&fields_sel) {
        let tag = element.value().name();
        let input_type = element
            .value()
            .attr("type")
            .unwrap_or("text")
            .to_lowercase();
        if tag == "input" && IGNORED_INPUT_TYPES.contains(&input_type.as_str()) {
            continue;
        }

        let kind = input_kind(tag, &input_type);
        let id = attr(element, "id");
        let name = attr(element, "name");
        let own_label = id
            .as_ref()
            .and_then(|id| labels.get(id).cloned())
            .or_else(|| wrapping_label(element));

        if kind == InputKind::SingleChoice {
            let option = own_label
                .or_else(|| attr(element, "value"))
                .unwrap_or_default();
            let group = name.clone().or_else(|| id.clone()).unwrap_or_default();

            if let Some(&index) = radio_groups.get(&group) {
                fields[index].question.options.push(option);
                continue;
            }

            let signals = FieldSignals {
                label: block_label(element, &inputs_sel, &labels_sel),
                aria_label: attr(element, "aria-label"),
                placeholder: None,
                name: name.clone(),
                id: None,
            };
            let Some(text) = question_text(&signals) else {
                debug!("Skipping radio group without any label signal");
                continue;
            };

            let required = is_required(element, signals.label.as_deref());
            radio_groups.insert(group, fields.len());
            fields.push(PageField {
                question: FormQuestion::new(text, kind).with_options([option]),
                locator: locate("input", signals),
                required,
            });
            continue;
        }

        let signals = FieldSignals {
            label: own_label.or_else(|| block_label(element, &inputs_sel, &labels_sel)),
            aria_label: attr(element, "aria-label"),
            placeholder: attr(element, "placeholder"),
            name,
            id,
        };
        let Some(text) = question_text(&signals) else {
            debug!("Skipping {} without any label signal", tag);
            continue;
        };

        let options = if kind == InputKind::Dropdown {
            element.select(&option_sel).map(element_text).collect()
        } else {
            Vec::new()
        };

        let required = is_required(element, signals.label.as_deref());
        fields.push(PageField {
            question: FormQuestion::new(text, kind).with_options(options),
            locator: locate(tag, signals),
            required,
        });
    }

    let buttons: Vec<PageButton> = document
        .select(&buttons_sel)
        .filter_map(|button| {
            let text = Some(element_text(button))
                .filter(|t| !t.is_empty())
                .or_else(|| attr(button, "value"))
                .or_else(|| attr(button, "aria-label"))?;
            let tag = button.value().name();
            // Links only count when they lead into an application.
            if tag == "a" && !text.to_lowercase().contains("apply") {
                return None;
            }
            let signals = FieldSignals {
                id: attr(button, "id"),
                name: attr(button, "name"),
                ..FieldSignals::default()
            };
            let enabled = button.value().attr("disabled").is_none()
                && button.value().attr("aria-disabled") != Some("true");
            Some(PageButton {
                text,
                selector: selector_for(tag, &signals),
                enabled,
                href: if tag == "a" { attr(button, "href") } else { None },
            })
        })
        .collect();

    let title = document
        .select(&title_sel)
        .next()
        .map(element_text)
        .unwrap_or_default();

    info!(
        "Scanned form '{}': {} fields, {} buttons",
        title,
        fields.len(),
        buttons.len()
    );

    Ok(FormScan {
        title,
        fields,
        buttons,
    })
}

/// Visible text of a page, without script and style content.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?;
            let parent_name = parent.value().as_element().map(|e| e.name())?;
            if NON_CONTENT_TAGS.contains(&parent_name) {
                None
            } else {
                Some(text.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&text)
}

pub fn snapshot(url: &str, html: &str) -> Result<PageSnapshot> {
    let scan = scan_document(html)?;
    Ok(PageSnapshot {
        url: url.to_string(),
        title: scan.title,
        text: page_text(html),
    })
}
