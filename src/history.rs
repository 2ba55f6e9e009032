// src/history.rs
//! CSV ledger of every application attempt

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::posting::AtsKind;
use crate::types::ApplicationOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub job_url: String,
    pub ats: AtsKind,
    pub outcome: ApplicationOutcome,
    pub steps: usize,
}

impl HistoryRecord {
    pub fn new(job_url: &str, outcome: ApplicationOutcome, steps: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            job_url: job_url.to_string(),
            ats: AtsKind::detect(job_url),
            outcome,
            steps,
        }
    }
}

/// The identity of a job for duplicate checks: the posting id for
/// `/jobs/view/<id>` urls, otherwise the url without query, fragment or
/// trailing slash. Anything that is not a url is compared as written.
pub fn job_key(url: &str) -> String {
    let url = url.trim();
    let Ok(mut parsed) = Url::parse(url) else {
        return url.trim_end_matches('/').to_lowercase();
    };
    parsed.set_query(None);
    parsed.set_fragment(None);

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let posting_id = segments
        .windows(3)
        .find(|w| w[0] == "jobs" && w[1] == "view")
        .map(|w| {
            w[2].chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .filter(|id| !id.is_empty());
    if let Some(id) = posting_id {
        return format!("job:{}", id);
    }

    parsed.as_str().trim_end_matches('/').to_lowercase()
}

#[derive(Debug)]
pub struct History {
    path: PathBuf,
    records: Vec<HistoryRecord>,
    applied: HashSet<String>,
}

impl History {
    /// Load the ledger at `path`; a missing file is an empty history.
    pub fn open(path: &Path) -> Result<Self> {
        let mut history = Self {
            path: path.to_path_buf(),
            records: Vec::new(),
            applied: HashSet::new(),
        };

        if !path.exists() {
            debug!("No history yet at {}", path.display());
            return Ok(history);
        }

        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open history: {}", path.display()))?;
        for record in reader.deserialize::<HistoryRecord>() {
            let record = record
                .with_context(|| format!("Failed to parse history: {}", path.display()))?;
            history.index(&record);
            history.records.push(record);
        }

        info!(
            "Loaded {} history records from {}",
            history.records.len(),
            path.display()
        );
        Ok(history)
    }

    fn index(&mut self, record: &HistoryRecord) {
        if matches!(
            record.outcome,
            ApplicationOutcome::Applied | ApplicationOutcome::Unconfirmed
        ) {
            self.applied.insert(job_key(&record.job_url));
        }
    }

    /// Whether this job was already submitted. Failed attempts and dry runs do
    /// not count.
    pub fn contains(&self, job_url: &str) -> bool {
        self.applied.contains(&job_key(job_url))
    }

    pub fn append(&mut self, record: HistoryRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let is_new = !self.path.exists()
            || std::fs::metadata(&self.path)
                .map(|m| m.len() == 0)
                .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history: {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer
            .serialize(&record)
            .context("Failed to write history record")?;
        writer.flush().context("Failed to flush history")?;

        self.index(&record);
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
