// src/events.rs
//! Application events and the sinks that receive them

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::profile::ProfileField;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ApplicationEvent {
    Started {
        job_url: String,
        attempt: u32,
    },
    FieldFilled {
        label: String,
        field: ProfileField,
        value: String,
    },
    FieldSkipped {
        label: String,
    },
    FillFailed {
        label: String,
        error: String,
    },
    StepAdvanced {
        step: usize,
        button: String,
    },
    Submitted {
        job_url: String,
        confirmed: bool,
        steps: usize,
    },
    Failed {
        job_url: String,
        reason: String,
    },
    /// Too many consecutive failures; a human should look at the session.
    OperatorAttention {
        job_url: String,
        consecutive_failures: u32,
        last_error: String,
    },
}

/// Receives every event of a run. Sinks never fail the run.
pub trait EventSink {
    fn emit(&self, event: &ApplicationEvent);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: &ApplicationEvent) {
        (**self).emit(event)
    }
}

fn preview(value: &str) -> String {
    let mut short: String = value.chars().take(30).collect();
    if value.chars().count() > 30 {
        short.push_str("...");
    }
    short
}

/// Logs each event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ApplicationEvent) {
        match event {
            ApplicationEvent::Started { job_url, attempt } => {
                info!(job_url = %job_url, attempt, "Starting application")
            }
            ApplicationEvent::FieldFilled {
                label,
                field,
                value,
            } => info!(%field, "Filled '{}' -> {}", label, preview(value)),
            ApplicationEvent::FieldSkipped { label } => info!("No answer for '{}'", label),
            ApplicationEvent::FillFailed { label, error } => {
                warn!("Failed to fill '{}': {}", label, error)
            }
            ApplicationEvent::StepAdvanced { step, button } => {
                info!(step, "Clicked '{}'", button)
            }
            ApplicationEvent::Submitted {
                job_url,
                confirmed,
                steps,
            } => info!(job_url = %job_url, confirmed, steps, "Application submitted"),
            ApplicationEvent::Failed { job_url, reason } => {
                error!(job_url = %job_url, "Application failed: {}", reason)
            }
            ApplicationEvent::OperatorAttention {
                job_url,
                consecutive_failures,
                last_error,
            } => error!(
                job_url = %job_url,
                consecutive_failures,
                "Operator attention needed: {}",
                last_error
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ApplicationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ApplicationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ApplicationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[derive(Serialize)]
struct EventLine<'a> {
    run_id: Uuid,
    at: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a ApplicationEvent,
}

/// Appends one JSON object per event to a file, for an operator or another
/// process to follow.
#[derive(Debug)]
pub struct JsonlSink {
    run_id: Uuid,
    file: Mutex<File>,
}

impl JsonlSink {
    pub fn open(path: &Path, run_id: Uuid) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event log: {}", path.display()))?;

        Ok(Self {
            run_id,
            file: Mutex::new(file),
        })
    }
}

impl EventSink for JsonlSink {
    fn emit(&self, event: &ApplicationEvent) {
        let line = EventLine {
            run_id: self.run_id,
            at: Utc::now(),
            event,
        };
        let json = match serde_json::to_string(&line) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize event: {}", e);
                return;
            }
        };
        match self.file.lock() {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", json) {
                    warn!("Failed to write event: {}", e);
                }
            }
            Err(_) => warn!("Event log lock poisoned"),
        }
    }
}

/// Forwards each event to several sinks.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink + Send + Sync>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + Send + Sync + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &ApplicationEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Counts consecutive failed applications and says when to page the operator.
#[derive(Debug, Clone)]
pub struct Escalation {
    threshold: u32,
    consecutive: u32,
}

impl Escalation {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Returns the attention event when this failure reaches the threshold.
    pub fn record_failure(&mut self, job_url: &str, error: &str) -> Option<ApplicationEvent> {
        self.consecutive += 1;
        if self.consecutive >= self.threshold {
            let event = ApplicationEvent::OperatorAttention {
                job_url: job_url.to_string(),
                consecutive_failures: self.consecutive,
                last_error: error.to_string(),
            };
            self.consecutive = 0;
            Some(event)
        } else {
            None
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}
