// src/applicant.rs
//! One application session: retries per job, escalation, history and totals

use anyhow::Result;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::{ApplicationEvent, EventSink, Escalation};
use crate::history::{job_key, History, HistoryRecord};
use crate::matcher::Matcher;
use crate::page::FormPage;
use crate::posting::{apply_entry, ApplyTarget};
use crate::timing::Pacing;
use crate::types::{ApplicationOutcome, FillReport, SessionStats};
use crate::wizard::{pick_button, Wizard, WizardConfig, WizardOutcome, WizardRun};

#[derive(Debug, Clone, Copy)]
pub struct ApplicantConfig {
    pub max_retries: u32,
    pub escalation_threshold: u32,
    /// Stop after this many submissions in one session.
    pub max_applications: Option<usize>,
    pub wizard: WizardConfig,
    pub between_jobs: Pacing,
    /// Nothing is really sent; outcomes are recorded as dry runs.
    pub dry_run: bool,
}

impl Default for ApplicantConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            escalation_threshold: 3,
            max_applications: None,
            wizard: WizardConfig::default(),
            between_jobs: Pacing::from_millis(5000, 10000),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationResult {
    pub job_url: String,
    pub outcome: ApplicationOutcome,
    pub attempts: u32,
    pub steps: usize,
    pub report: FillReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub run_id: Uuid,
    pub stats: SessionStats,
    pub results: Vec<ApplicationResult>,
}

pub struct Applicant<'a, P, S> {
    matcher: &'a Matcher,
    page: P,
    sink: S,
    config: ApplicantConfig,
    history: Option<History>,
    escalation: Escalation,
    stats: SessionStats,
    run_id: Uuid,
}

impl<'a, P, S> Applicant<'a, P, S>
where
    P: FormPage,
    S: EventSink,
{
    pub fn new(matcher: &'a Matcher, page: P, sink: S, config: ApplicantConfig) -> Self {
        Self {
            matcher,
            page,
            sink,
            escalation: Escalation::new(config.escalation_threshold),
            config,
            history: None,
            stats: SessionStats::default(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get from a job page into its form: click the on-site apply button or
    /// follow the link to the employer's site. Pages already showing a form
    /// are left alone.
    async fn enter_application(&mut self) -> Result<()> {
        let buttons = self.page.buttons().await?;
        if pick_button(&buttons).is_some() {
            return Ok(());
        }
        let Some((target, button)) = apply_entry(&buttons) else {
            return Ok(());
        };

        match target {
            ApplyTarget::External { url, ats } => {
                info!("Following apply link to {} ({})", url, ats);
                self.page.open(&url).await?;
            }
            _ => {
                info!("Opening application with '{}'", button.text);
                self.page.click(button).await?;
            }
        }
        self.config.wizard.pacing.pause().await;
        Ok(())
    }

    async fn attempt(&mut self, job_url: &str) -> Result<WizardRun> {
        self.page.open(job_url).await?;
        self.enter_application().await?;
        let wizard = Wizard::new(self.matcher, self.config.wizard);
        wizard.run(&mut self.page, &self.sink).await
    }

    async fn capture(&mut self, job_url: &str, attempt: u32) {
        let name = format!("attempt{}_{}", attempt, job_key(job_url));
        if let Err(e) = self.page.screenshot(&name).await {
            warn!("Failed to capture page after error: {}", e);
        }
    }

    /// Apply to one job. Individual attempt failures are retried and reported;
    /// only a failure to record the outcome is an error.
    pub async fn apply(&mut self, job_url: &str) -> Result<ApplicationResult> {
        if self
            .history
            .as_ref()
            .is_some_and(|history| history.contains(job_url))
        {
            info!("Already applied, skipping: {}", job_url);
            self.stats.record(ApplicationOutcome::Duplicate);
            return Ok(ApplicationResult {
                job_url: job_url.to_string(),
                outcome: ApplicationOutcome::Duplicate,
                attempts: 0,
                steps: 0,
                report: FillReport::default(),
                error: None,
            });
        }

        let max_attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();
        let mut report = FillReport::default();
        let mut result = None;

        for attempt in 1..=max_attempts {
            self.sink.emit(&ApplicationEvent::Started {
                job_url: job_url.to_string(),
                attempt,
            });

            match self.attempt(job_url).await {
                Ok(run) => {
                    report = run.report;
                    match run.outcome {
                        WizardOutcome::Submitted { steps } => {
                            result = Some((ApplicationOutcome::Applied, steps, attempt));
                            break;
                        }
                        // Submit was clicked; retrying could send a second application.
                        WizardOutcome::Unconfirmed { steps } => {
                            result = Some((ApplicationOutcome::Unconfirmed, steps, attempt));
                            break;
                        }
                        WizardOutcome::Stalled { step } => {
                            last_error = format!("No way forward at step {}", step);
                        }
                        WizardOutcome::StepLimit { steps } => {
                            last_error = format!("Did not reach submit within {} steps", steps);
                        }
                    }
                }
                Err(e) => {
                    last_error = format!("{:#}", e);
                }
            }

            warn!(
                "Attempt {}/{} for {} failed: {}",
                attempt, max_attempts, job_url, last_error
            );
            self.capture(job_url, attempt).await;
            if attempt < max_attempts {
                self.config.wizard.pacing.pause().await;
            }
        }

        let application = match result {
            Some((outcome, steps, attempts)) => {
                self.sink.emit(&ApplicationEvent::Submitted {
                    job_url: job_url.to_string(),
                    confirmed: outcome == ApplicationOutcome::Applied,
                    steps,
                });
                self.escalation.record_success();
                let outcome = if self.config.dry_run {
                    ApplicationOutcome::DryRun
                } else {
                    outcome
                };
                ApplicationResult {
                    job_url: job_url.to_string(),
                    outcome,
                    attempts,
                    steps,
                    report,
                    error: None,
                }
            }
            None => {
                self.sink.emit(&ApplicationEvent::Failed {
                    job_url: job_url.to_string(),
                    reason: last_error.clone(),
                });
                if let Some(event) = self.escalation.record_failure(job_url, &last_error) {
                    self.sink.emit(&event);
                }
                ApplicationResult {
                    job_url: job_url.to_string(),
                    outcome: ApplicationOutcome::Failed,
                    attempts: max_attempts,
                    steps: 0,
                    report,
                    error: Some(last_error),
                }
            }
        };

        self.stats.record(application.outcome);
        if let Some(history) = self.history.as_mut() {
            history.append(HistoryRecord::new(
                job_url,
                application.outcome,
                application.steps,
            ))?;
        }

        Ok(application)
    }

    /// Apply to each job in turn until the list or the session cap runs out.
    pub async fn apply_all<I>(&mut self, job_urls: I) -> Result<SessionSummary>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let started = Instant::now();
        let mut results = Vec::new();

        info!("Session {} starting", self.run_id);

        for job_url in job_urls {
            if let Some(cap) = self.config.max_applications {
                if self.stats.submitted() as usize >= cap {
                    info!("Reached the session cap of {} applications", cap);
                    break;
                }
            }

            let result = self.apply(job_url.as_ref()).await?;
            let was_attempted = result.outcome != ApplicationOutcome::Duplicate;
            results.push(result);

            if was_attempted {
                let waited = self.config.between_jobs.pause().await;
                info!("Waited {:.1}s before the next job", waited.as_secs_f64());
            }
        }

        self.stats.duration_secs = started.elapsed().as_secs();
        info!(
            "Session {} finished: {} applied, {} unconfirmed, {} dry runs, {} failed, {} duplicates in {}s",
            self.run_id,
            self.stats.applied,
            self.stats.unconfirmed,
            self.stats.dry_runs,
            self.stats.failed,
            self.stats.duplicates,
            self.stats.duration_secs
        );

        Ok(SessionSummary {
            run_id: self.run_id,
            stats: self.stats.clone(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::profile::Profile;
    use crate::types::PageButton;
    use crate::wizard::tests::{easy_apply_steps, text_field, ScriptedWizard};

    fn quick_config() -> ApplicantConfig {
        ApplicantConfig {
            max_retries: 2,
            escalation_threshold: 2,
            max_applications: None,
            wizard: WizardConfig {
                max_steps: 5,
                pacing: Pacing::none(),
            },
            between_jobs: Pacing::none(),
            dry_run: false,
        }
    }

    fn count<F: Fn(&ApplicationEvent) -> bool>(sink: &RecordingSink, f: F) -> usize {
        sink.events().iter().filter(|e| f(e)).count()
    }

    #[tokio::test]
    async fn test_applies_and_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join("history.csv");
        let matcher = Matcher::new(Profile::sample());
        let sink = RecordingSink::new();

        let mut applicant = Applicant::new(
            &matcher,
            ScriptedWizard::new(easy_apply_steps()),
            &sink,
            quick_config(),
        )
        .with_history(History::open(&history_path).unwrap());

        let summary = applicant
            .apply_all([
                "https://www.linkedin.com/jobs/view/1/",
                "https://www.linkedin.com/jobs/view/1/?trk=again",
            ])
            .await
            .unwrap();

        assert_eq!(summary.stats.applied, 1);
        assert_eq!(summary.stats.duplicates, 1);
        assert_eq!(summary.results[0].outcome, ApplicationOutcome::Applied);
        assert_eq!(summary.results[0].steps, 3);
        assert_eq!(summary.results[1].outcome, ApplicationOutcome::Duplicate);

        assert_eq!(
            count(&sink, |e| matches!(
                e,
                ApplicationEvent::Submitted {
                    confirmed: true,
                    ..
                }
            )),
            1
        );

        let history = History::open(&history_path).unwrap();
        assert_eq!(history.records().len(), 1);
        assert!(history.contains("https://www.linkedin.com/jobs/view/1"));
    }

    #[tokio::test]
    async fn test_retries_then_escalates() {
        let matcher = Matcher::new(Profile::sample());
        let sink = RecordingSink::new();
        let mut page = ScriptedWizard::new(easy_apply_steps());
        page.fail_open = true;

        let mut applicant = Applicant::new(&matcher, page, &sink, quick_config());

        let first = applicant.apply("https://jobs.lever.co/acme/1").await.unwrap();
        assert_eq!(first.outcome, ApplicationOutcome::Failed);
        assert_eq!(first.attempts, 2);
        assert!(first.error.as_deref().unwrap().contains("connection reset"));
        assert_eq!(
            count(&sink, |e| matches!(e, ApplicationEvent::Started { .. })),
            2
        );
        assert_eq!(
            count(&sink, |e| matches!(e, ApplicationEvent::OperatorAttention { .. })),
            0
        );

        applicant.apply("https://jobs.lever.co/acme/2").await.unwrap();
        assert_eq!(
            count(&sink, |e| matches!(e, ApplicationEvent::OperatorAttention { .. })),
            1
        );
        assert_eq!(applicant.stats().failed, 2);
    }

    #[tokio::test]
    async fn test_unconfirmed_is_not_retried() {
        let matcher = Matcher::new(Profile::sample());
        let sink = RecordingSink::new();
        let mut page = ScriptedWizard::new(easy_apply_steps());
        page.confirmation_text = "Please wait".to_string();

        let mut applicant = Applicant::new(&matcher, page, &sink, quick_config());
        let result = applicant
            .apply("https://www.linkedin.com/jobs/view/9")
            .await
            .unwrap();

        assert_eq!(result.outcome, ApplicationOutcome::Unconfirmed);
        assert_eq!(result.attempts, 1);
        assert_eq!(
            count(&sink, |e| matches!(
                e,
                ApplicationEvent::Submitted {
                    confirmed: false,
                    ..
                }
            )),
            1
        );
    }

    #[tokio::test]
    async fn test_unreadable_page_after_submit_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join("history.csv");
        let matcher = Matcher::new(Profile::sample());
        let mut page = ScriptedWizard::new(easy_apply_steps());
        page.fail_snapshot = true;

        let mut applicant = Applicant::new(&matcher, page, RecordingSink::new(), quick_config())
            .with_history(History::open(&history_path).unwrap());
        let result = applicant
            .apply("https://www.linkedin.com/jobs/view/12")
            .await
            .unwrap();

        assert_eq!(result.outcome, ApplicationOutcome::Unconfirmed);
        assert_eq!(result.attempts, 1);
        assert_eq!(applicant.page().submit_clicks, 1);

        let again = applicant
            .apply("https://www.linkedin.com/jobs/view/12/")
            .await
            .unwrap();
        assert_eq!(again.outcome, ApplicationOutcome::Duplicate);
        assert_eq!(applicant.page().submit_clicks, 1);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_block_a_real_application() {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join("history.csv");
        let matcher = Matcher::new(Profile::sample());
        let job = "https://www.linkedin.com/jobs/view/77";

        let mut config = quick_config();
        config.dry_run = true;
        let mut dry = Applicant::new(
            &matcher,
            ScriptedWizard::new(easy_apply_steps()),
            RecordingSink::new(),
            config,
        )
        .with_history(History::open(&history_path).unwrap());
        let result = dry.apply(job).await.unwrap();
        assert_eq!(result.outcome, ApplicationOutcome::DryRun);
        assert_eq!(dry.stats().dry_runs, 1);

        let history = History::open(&history_path).unwrap();
        assert_eq!(history.records()[0].outcome, ApplicationOutcome::DryRun);
        assert!(!history.contains(job));

        let mut real = Applicant::new(
            &matcher,
            ScriptedWizard::new(easy_apply_steps()),
            RecordingSink::new(),
            quick_config(),
        )
        .with_history(history);
        let result = real.apply(job).await.unwrap();
        assert_eq!(result.outcome, ApplicationOutcome::Applied);
    }

    #[tokio::test]
    async fn test_clicks_easy_apply_before_the_wizard() {
        let matcher = Matcher::new(Profile::sample());
        let mut steps = vec![(
            vec![],
            vec![PageButton::new("Save"), PageButton::new("Easy Apply")],
        )];
        steps.extend(easy_apply_steps());

        let mut applicant = Applicant::new(
            &matcher,
            ScriptedWizard::new(steps),
            RecordingSink::new(),
            quick_config(),
        );
        let result = applicant
            .apply("https://www.linkedin.com/jobs/view/5")
            .await
            .unwrap();

        assert_eq!(result.outcome, ApplicationOutcome::Applied);
        assert_eq!(result.steps, 3);
        assert_eq!(result.report.filled.len(), 3);
    }

    #[tokio::test]
    async fn test_follows_external_apply_link() {
        let matcher = Matcher::new(Profile::sample());
        let external = "https://boards.greenhouse.io/acme/jobs/42";
        let mut steps = vec![(
            vec![],
            vec![PageButton::new("Apply on company website").with_href(external)],
        )];
        steps.extend(easy_apply_steps());
        let mut page = ScriptedWizard::new(steps);
        page.landing.insert(external.to_string(), 1);

        let mut applicant = Applicant::new(&matcher, page, RecordingSink::new(), quick_config());
        let result = applicant
            .apply("https://www.linkedin.com/jobs/view/6")
            .await
            .unwrap();

        assert_eq!(result.outcome, ApplicationOutcome::Applied);
        assert_eq!(
            applicant.page().opened,
            vec!["https://www.linkedin.com/jobs/view/6", external]
        );
    }

    #[tokio::test]
    async fn test_stalled_wizard_counts_as_failure() {
        let matcher = Matcher::new(Profile::sample());
        let page = ScriptedWizard::new(vec![(
            vec![text_field("Email")],
            vec![PageButton::new("Cancel")],
        )]);
        let mut applicant = Applicant::new(&matcher, page, RecordingSink::new(), quick_config());

        let result = applicant
            .apply("https://boards.greenhouse.io/acme/jobs/3")
            .await
            .unwrap();
        assert_eq!(result.outcome, ApplicationOutcome::Failed);
        assert_eq!(result.error.as_deref(), Some("No way forward at step 1"));
        assert_eq!(result.report.filled.len(), 1);
    }

    #[tokio::test]
    async fn test_session_cap() {
        let matcher = Matcher::new(Profile::sample());
        let mut config = quick_config();
        config.max_applications = Some(1);
        let mut applicant = Applicant::new(
            &matcher,
            ScriptedWizard::new(easy_apply_steps()),
            RecordingSink::new(),
            config,
        );

        let summary = applicant
            .apply_all(vec![
                "https://www.linkedin.com/jobs/view/1".to_string(),
                "https://www.linkedin.com/jobs/view/2".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.stats.attempted(), 1);
    }
}
