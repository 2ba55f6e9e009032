// src/filler.rs
//! Best-effort filling of every question on the current page

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::events::{ApplicationEvent, EventSink};
use crate::matcher::{Answer, Matcher};
use crate::page::FormPage;
use crate::profile::ProfileField;
use crate::types::{FailedField, FillAction, FillReport, FilledField, InputKind, PageField};

/// Turn a matched answer into the action for the field's input kind.
pub fn action_for(field: &PageField, answer: &Answer) -> Option<FillAction> {
    match field.question.kind {
        InputKind::ShortText | InputKind::MultiLineText => Some(FillAction::Type {
            text: answer.value.clone(),
        }),
        InputKind::SingleChoice | InputKind::Dropdown => match answer.option_index {
            Some(index) => Some(FillAction::Select {
                index,
                label: answer.value.clone(),
            }),
            // No options were scanned; type the answer into the combobox.
            None => Some(FillAction::Type {
                text: answer.value.clone(),
            }),
        },
        InputKind::Checkbox => Some(FillAction::Check),
        InputKind::File if answer.field == ProfileField::Resume => Some(FillAction::Upload {
            path: PathBuf::from(&answer.value),
        }),
        InputKind::File => None,
    }
}

pub struct FormFiller<'a> {
    matcher: &'a Matcher,
}

impl<'a> FormFiller<'a> {
    pub fn new(matcher: &'a Matcher) -> Self {
        Self { matcher }
    }

    /// Fill what can be answered. A field that fails is reported and skipped;
    /// only failing to read the page at all is an error.
    pub async fn fill_page<P, S>(&self, page: &mut P, sink: &S) -> Result<FillReport>
    where
        P: FormPage,
        S: EventSink + ?Sized,
    {
        let fields = page.fields().await?;
        let mut report = FillReport::default();

        for field in &fields {
            let label = field.question.label.clone();

            let Some((answer, action)) = self
                .matcher
                .answer(&field.question)
                .and_then(|answer| action_for(field, &answer).map(|action| (answer, action)))
            else {
                debug!("Skipping '{}'", label);
                sink.emit(&ApplicationEvent::FieldSkipped {
                    label: label.clone(),
                });
                report.skipped.push(label);
                continue;
            };

            match page.fill(field, &action).await {
                Ok(()) => {
                    sink.emit(&ApplicationEvent::FieldFilled {
                        label: label.clone(),
                        field: answer.field,
                        value: answer.value.clone(),
                    });
                    report.filled.push(FilledField {
                        label,
                        field: answer.field,
                        action,
                    });
                }
                Err(e) => {
                    let error = format!("{:#}", e);
                    sink.emit(&ApplicationEvent::FillFailed {
                        label: label.clone(),
                        error: error.clone(),
                    });
                    let capture = format!("fill_failed_{}", label);
                    if let Err(e) = page.screenshot(&capture).await {
                        debug!("Capture after failed fill also failed: {}", e);
                    }
                    report.failed.push(FailedField { label, error });
                }
            }
        }

        Ok(report)
    }
}
