// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::applicant::ApplicantConfig;
use crate::search::TitleScorer;
use crate::timing::Pacing;
use crate::wizard::WizardConfig;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub profile_path: PathBuf,
    pub log_path: PathBuf,
    pub screenshots_dir: PathBuf,
    pub history_path: PathBuf,
    pub events_path: PathBuf,
    pub max_wizard_steps: usize,
    pub max_retries: u32,
    pub escalation_threshold: u32,
    pub max_applications_per_run: Option<usize>,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub min_job_delay_ms: u64,
    pub max_job_delay_ms: u64,
    pub search_page_limit: usize,
    pub http_timeout_secs: u64,
    pub min_match_score: u32,
    pub title_scorer: TitleScorer,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            profile_path: PathBuf::from("profile.yaml"),
            log_path: PathBuf::from("logs/autoapply.log"),
            screenshots_dir: PathBuf::from("logs/screenshots"),
            history_path: PathBuf::from("data/history.csv"),
            events_path: PathBuf::from("logs/events.jsonl"),
            max_wizard_steps: 10,
            max_retries: 2,
            escalation_threshold: 3,
            max_applications_per_run: None,
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            min_job_delay_ms: 5000,
            max_job_delay_ms: 10000,
            search_page_limit: 3,
            http_timeout_secs: 30,
            min_match_score: 0,
            title_scorer: TitleScorer::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: RunConfig,
    #[serde(default)]
    production: RunConfig,
}

impl RunConfig {
    /// Load the section for the current environment from `path` (or
    /// `config.yaml`), falling back to defaults when the file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::parse(&content, &environment)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else if path.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        } else {
            info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Self::default()
        };

        let config = match std::env::var("AUTOAPPLY_PROFILE") {
            Ok(profile) if !profile.trim().is_empty() => config.with_profile_path(profile.into()),
            _ => config,
        };

        config.resolved()
    }

    fn get_environment() -> String {
        std::env::var("AUTOAPPLY_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn parse(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Invalid configuration YAML")?;

        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    fn resolved(self) -> Result<Self> {
        Ok(Self {
            profile_path: Self::resolve_path(&self.profile_path)?,
            log_path: Self::resolve_path(&self.log_path)?,
            screenshots_dir: Self::resolve_path(&self.screenshots_dir)?,
            history_path: Self::resolve_path(&self.history_path)?,
            events_path: Self::resolve_path(&self.events_path)?,
            ..self
        })
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    pub fn with_profile_path(mut self, path: PathBuf) -> Self {
        self.profile_path = path;
        self
    }

    pub fn with_history_path(mut self, path: PathBuf) -> Self {
        self.history_path = path;
        self
    }

    pub fn with_screenshots_dir(mut self, dir: PathBuf) -> Self {
        self.screenshots_dir = dir;
        self
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::from_millis(self.min_delay_ms, self.max_delay_ms)
    }

    pub fn job_pacing(&self) -> Pacing {
        Pacing::from_millis(self.min_job_delay_ms, self.max_job_delay_ms)
    }

    pub fn wizard_config(&self) -> WizardConfig {
        WizardConfig {
            max_steps: self.max_wizard_steps.max(1),
            pacing: self.pacing(),
        }
    }

    pub fn applicant_config(&self) -> ApplicantConfig {
        ApplicantConfig {
            max_retries: self.max_retries,
            escalation_threshold: self.escalation_threshold,
            max_applications: self.max_applications_per_run,
            wizard: self.wizard_config(),
            between_jobs: self.job_pacing(),
            dry_run: false,
        }
    }

    /// Create the directories the run writes into
    pub async fn ensure_directories(&self) -> Result<()> {
        let files = [&self.log_path, &self.history_path, &self.events_path];

        for file in files {
            if let Some(parent) = file.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        tokio::fs::create_dir_all(&self.screenshots_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create directory: {}",
                    self.screenshots_dir.display()
                )
            })?;

        info!("All configured directories ensured to exist");
        Ok(())
    }
}
