// src/types/report.rs
//! Serializable results of filling forms and running applications

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::profile::ProfileField;

/// What to do with a field once its answer is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FillAction {
    Type { text: String },
    Select { index: usize, label: String },
    Check,
    Upload { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilledField {
    pub label: String,
    pub field: ProfileField,
    pub action: FillAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedField {
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillReport {
    pub filled: Vec<FilledField>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedField>,
}

impl FillReport {
    pub fn total(&self) -> usize {
        self.filled.len() + self.skipped.len() + self.failed.len()
    }

    pub fn merge(&mut self, other: FillReport) {
        self.filled.extend(other.filled);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationOutcome {
    Applied,
    Unconfirmed,
    /// Walked through without sending anything.
    DryRun,
    Failed,
    Duplicate,
}

impl ApplicationOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationOutcome::Applied => "applied",
            ApplicationOutcome::Unconfirmed => "unconfirmed",
            ApplicationOutcome::DryRun => "dry_run",
            ApplicationOutcome::Failed => "failed",
            ApplicationOutcome::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub applied: u32,
    pub unconfirmed: u32,
    #[serde(default)]
    pub dry_runs: u32,
    pub failed: u32,
    pub duplicates: u32,
    pub duration_secs: u64,
}

impl SessionStats {
    pub fn record(&mut self, outcome: ApplicationOutcome) {
        match outcome {
            ApplicationOutcome::Applied => self.applied += 1,
            ApplicationOutcome::Unconfirmed => self.unconfirmed += 1,
            ApplicationOutcome::DryRun => self.dry_runs += 1,
            ApplicationOutcome::Failed => self.failed += 1,
            ApplicationOutcome::Duplicate => self.duplicates += 1,
        }
    }

    pub fn attempted(&self) -> u32 {
        self.submitted() + self.failed
    }

    /// Runs that reached the submit button, dry runs included.
    pub fn submitted(&self) -> u32 {
        self.applied + self.unconfirmed + self.dry_runs
    }
}
