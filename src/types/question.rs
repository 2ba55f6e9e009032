// src/types/question.rs
//! Form questions as observed on a live page

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    ShortText,
    MultiLineText,
    SingleChoice,
    Dropdown,
    Checkbox,
    File,
}

impl InputKind {
    pub fn has_options(self) -> bool {
        matches!(self, InputKind::SingleChoice | InputKind::Dropdown)
    }
}

/// A question observed on the page. Lives only while the page is scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormQuestion {
    pub label: String,
    pub kind: InputKind,
    #[serde(default)]
    pub options: Vec<String>,
}

impl FormQuestion {
    pub fn new(label: impl Into<String>, kind: InputKind) -> Self {
        Self {
            label: label.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Raw attributes a field can be recognised by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSignals {
    pub label: Option<String>,
    pub aria_label: Option<String>,
    pub placeholder: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
}

/// How to find a field again once its answer is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLocator {
    pub selector: Option<String>,
    pub signals: FieldSignals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageField {
    pub question: FormQuestion,
    pub locator: FieldLocator,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageButton {
    pub text: String,
    pub selector: Option<String>,
    pub enabled: bool,
    /// Target of a link styled as a button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl PageButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selector: None,
            enabled: true,
            href: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Text-level view of the current page, used to confirm submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub text: String,
}
