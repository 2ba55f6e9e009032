// src/matcher/mod.rs
//! Question-to-answer matching against a fixed profile

pub mod options;
pub mod rules;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::profile::{yes_no, Profile, ProfileField};
use crate::types::{FormQuestion, InputKind};

pub use options::{choose_option, is_placeholder};
pub use rules::{Rule, DEFAULT_RULES, RESUME_KEYWORDS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub field: ProfileField,
    /// For choice inputs this is the chosen option label.
    pub value: String,
    pub option_index: Option<usize>,
}

/// Matches questions to profile values. Holds no mutable state; the same
/// question always yields the same answer.
#[derive(Debug, Clone)]
pub struct Matcher {
    profile: Profile,
    rules: Vec<Rule>,
}

impl Matcher {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Answer for a bare question text, treated as a short text input
    pub fn resolve(&self, question: &str) -> Option<Answer> {
        self.answer(&FormQuestion::new(question, InputKind::ShortText))
    }

    pub fn answer(&self, question: &FormQuestion) -> Option<Answer> {
        let text = normalize(&question.label);
        if text.is_empty() {
            return None;
        }

        if question.kind == InputKind::File {
            return self.answer_file(&text);
        }

        let (rule, mut value) = self.lookup(&text)?;
        let field = rule.field;

        if field.is_yes_no() && is_negated(&text, rule.keywords) {
            value = yes_no(value != "Yes").to_string();
        }

        if question.kind.has_options() && !question.options.is_empty() {
            let index = choose_option(&question.options, &value)?;
            debug!(
                "Question '{}' -> {} -> option '{}'",
                text, field, question.options[index]
            );
            return Some(Answer {
                field,
                value: question.options[index].clone(),
                option_index: Some(index),
            });
        }

        if question.kind == InputKind::Checkbox && value != "Yes" {
            return None;
        }

        debug!("Question '{}' -> {}", text, field);
        Some(Answer {
            field,
            value,
            option_index: None,
        })
    }

    fn lookup(&self, text: &str) -> Option<(&Rule, String)> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(text))
            .find_map(|rule| self.profile.value(rule.field).map(|v| (rule, v)))
    }

    fn answer_file(&self, text: &str) -> Option<Answer> {
        if !RESUME_KEYWORDS.iter().any(|k| text.contains(k)) {
            return None;
        }
        self.profile
            .value(ProfileField::Resume)
            .map(|value| Answer {
                field: ProfileField::Resume,
                value,
                option_index: None,
            })
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// Words before the keyword that may carry its negation.
const NEGATION_WINDOW: usize = 3;

/// True when the question is phrased in the negative ("are you not
/// authorized", "you don't require sponsorship"), which flips a yes/no
/// answer. Only the asked clause counts, and only near the matched keyword,
/// so fine print after the question mark is ignored.
fn is_negated(text: &str, keywords: &[&str]) -> bool {
    let clause = text.split('?').next().unwrap_or(text);
    let Some(position) = keywords.iter().filter_map(|k| clause.find(k)).min() else {
        return false;
    };

    let words: Vec<&str> = clause[..position]
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    let start = words.len().saturating_sub(NEGATION_WINDOW);

    (start..words.len()).any(|i| {
        let previous = if i > 0 { words[i - 1] } else { "" };
        match words[i] {
            "not" | "never" => !matches!(previous, "if" | "or" | "whether"),
            w => w.ends_with("n't"),
        }
    })
}
