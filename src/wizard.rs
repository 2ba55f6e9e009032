// src/wizard.rs
//! Walking a multi-step application wizard to its submit button

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::events::{ApplicationEvent, EventSink};
use crate::filler::FormFiller;
use crate::matcher::Matcher;
use crate::page::FormPage;
use crate::timing::Pacing;
use crate::types::{FillReport, PageButton, PageSnapshot};

pub const DEFAULT_MAX_STEPS: usize = 10;

const CONFIRMATION_PHRASES: &[&str] = &[
    "thank you for applying",
    "thank you",
    "application submitted",
    "application was sent",
    "your application has been submitted",
    "received your application",
    "successfully submitted",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonRole {
    Other,
    Next,
    Review,
    Submit,
}

/// Role of a button by its visible text.
pub fn classify(text: &str) -> ButtonRole {
    let text = text.to_lowercase();
    if text.contains("submit") || text.contains("send application") {
        ButtonRole::Submit
    } else if text.contains("review") {
        ButtonRole::Review
    } else if text.contains("next") || text.contains("continue") {
        ButtonRole::Next
    } else {
        ButtonRole::Other
    }
}

/// The enabled button that moves the wizard furthest, submit first.
pub fn pick_button(buttons: &[PageButton]) -> Option<(ButtonRole, &PageButton)> {
    // Reversed so that the first of equally ranked buttons wins.
    buttons
        .iter()
        .rev()
        .filter(|b| b.enabled)
        .map(|b| (classify(&b.text), b))
        .filter(|(role, _)| *role != ButtonRole::Other)
        .max_by_key(|(role, _)| *role)
}

pub fn is_confirmation(snapshot: &PageSnapshot) -> bool {
    let url = snapshot.url.to_lowercase();
    if url.contains("thank") || url.contains("confirmation") {
        return true;
    }
    let title = snapshot.title.to_lowercase();
    if title.contains("thank") || title.contains("confirmation") {
        return true;
    }
    let text = snapshot.text.to_lowercase();
    CONFIRMATION_PHRASES.iter().any(|p| text.contains(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WizardOutcome {
    /// Submit clicked and the page confirmed it.
    Submitted { steps: usize },
    /// Submit clicked but no confirmation was found.
    Unconfirmed { steps: usize },
    /// No enabled next/review/submit button on the page.
    Stalled { step: usize },
    StepLimit { steps: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardRun {
    pub outcome: WizardOutcome,
    pub report: FillReport,
    pub clicked: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct WizardConfig {
    pub max_steps: usize,
    pub pacing: Pacing,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            pacing: Pacing::default(),
        }
    }
}

pub struct Wizard<'a> {
    filler: FormFiller<'a>,
    config: WizardConfig,
}

impl<'a> Wizard<'a> {
    pub fn new(matcher: &'a Matcher, config: WizardConfig) -> Self {
        Self {
            filler: FormFiller::new(matcher),
            config,
        }
    }

    pub async fn run<P, S>(&self, page: &mut P, sink: &S) -> Result<WizardRun>
    where
        P: FormPage,
        S: EventSink + ?Sized,
    {
        let mut report = FillReport::default();
        let mut clicked = Vec::new();

        for step in 1..=self.config.max_steps {
            info!("Wizard step {}/{}", step, self.config.max_steps);

            report.merge(self.filler.fill_page(page, sink).await?);
            self.config.pacing.pause().await;

            let buttons = page.buttons().await?;
            let Some((role, button)) = pick_button(&buttons) else {
                warn!("No enabled next/review/submit button at step {}", step);
                return Ok(WizardRun {
                    outcome: WizardOutcome::Stalled { step },
                    report,
                    clicked,
                });
            };

            page.click(button).await?;
            clicked.push(button.text.clone());
            sink.emit(&ApplicationEvent::StepAdvanced {
                step,
                button: button.text.clone(),
            });
            self.config.pacing.pause().await;

            // Past this click the application may have been sent, so nothing
            // below may turn the run into an error.
            if role == ButtonRole::Submit {
                let outcome = match page.snapshot().await {
                    Ok(snapshot) if is_confirmation(&snapshot) => {
                        WizardOutcome::Submitted { steps: step }
                    }
                    Ok(_) => WizardOutcome::Unconfirmed { steps: step },
                    Err(e) => {
                        warn!("Could not read the page after submitting: {:#}", e);
                        if let Err(e) = page.screenshot("after_submit").await {
                            warn!("Failed to capture page after submit: {}", e);
                        }
                        WizardOutcome::Unconfirmed { steps: step }
                    }
                };
                return Ok(WizardRun {
                    outcome,
                    report,
                    clicked,
                });
            }
        }

        warn!(
            "Gave up after {} steps without reaching submit",
            self.config.max_steps
        );
        Ok(WizardRun {
            outcome: WizardOutcome::StepLimit {
                steps: self.config.max_steps,
            },
            report,
            clicked,
        })
    }
}
