// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::applicant::Applicant;
use crate::config::RunConfig;
use crate::events::{FanoutSink, JsonlSink, RecordingSink, TracingSink};
use crate::filler::FormFiller;
use crate::history::History;
use crate::matcher::Matcher;
use crate::page::{http_client, load_html, HtmlFormPage};
use crate::posting::PostingFetcher;
use crate::profile::Profile;
use crate::scanner;
use crate::search::{self, SearchQuery};
use crate::timing::Pacing;
use crate::types::{FillAction, FormQuestion, InputKind};

#[derive(Parser)]
#[command(name = "autoapply")]
#[command(about = "Answer job application forms from a profile")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./config.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile file, overriding the configured one
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a single form question from the profile
    Answer {
        question: String,
        #[arg(long, value_enum, default_value = "short-text")]
        kind: InputKind,
        /// Option label for choice questions; repeat for each option
        #[arg(long = "option")]
        options: Vec<String>,
    },
    /// List the fields and buttons of a form (file path or URL)
    Scan { source: String },
    /// Show what would be filled into a form, without submitting
    Plan { source: String },
    /// Dry-run whole applications against saved or fetched forms
    Walk {
        #[arg(required = true)]
        sources: Vec<String>,
        /// Append outcomes to the history ledger as dry runs
        #[arg(long)]
        record: bool,
    },
    /// Fetch a job posting and show where to apply
    Posting { url: String },
    /// Build a job search URL
    SearchUrl {
        keywords: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Zero-based result page
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Include postings without Easy Apply
        #[arg(long)]
        all: bool,
    },
    /// List job links from a search results page (file path or URL)
    Jobs { source: String },
    /// Inspect or create the profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Show past application outcomes
    History,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Validate the profile and show what it answers
    Check,
    /// Write a starter profile
    Init {
        #[arg(default_value = "profile.yaml")]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn load_matcher(config: &RunConfig) -> Result<Matcher> {
    let profile = Profile::load(&config.profile_path)?;
    Ok(Matcher::new(profile))
}

fn describe(action: &FillAction) -> String {
    match action {
        FillAction::Type { text } => format!("type \"{}\"", text),
        FillAction::Select { index, label } => format!("select #{} \"{}\"", index, label),
        FillAction::Check => "check".to_string(),
        FillAction::Upload { path } => format!("upload {}", path.display()),
    }
}

pub async fn handle_command(cli: Cli, mut config: RunConfig) -> Result<()> {
    if let Some(profile) = cli.profile.clone() {
        config = config.with_profile_path(profile);
    }
    let json = cli.json;

    match cli.command {
        Command::Answer {
            question,
            kind,
            options,
        } => {
            let matcher = load_matcher(&config)?;
            let question = FormQuestion::new(question, kind).with_options(options);
            let answer = matcher.answer(&question);

            if json {
                return print_json(&answer);
            }
            match answer {
                Some(answer) => println!("{}: {}", answer.field, answer.value),
                None => println!("No answer for \"{}\"", question.label),
            }
        }

        Command::Scan { source } => {
            let client = http_client(config.http_timeout_secs)?;
            let html = load_html(&client, &source).await?;
            let scan = scanner::scan_document(&html)?;

            if json {
                return print_json(&scan);
            }
            println!("{} ({} fields)", scan.title, scan.fields.len());
            for field in &scan.fields {
                println!(
                    "  {}{} [{:?}] {}",
                    field.question.label,
                    if field.required { " *" } else { "" },
                    field.question.kind,
                    field.locator.selector.as_deref().unwrap_or("-")
                );
                if !field.question.options.is_empty() {
                    println!("      options: {}", field.question.options.join(" | "));
                }
            }
            for button in &scan.buttons {
                println!(
                    "  [{}]{}",
                    button.text,
                    if button.enabled { "" } else { " (disabled)" }
                );
            }
        }

        Command::Plan { source } => {
            let matcher = load_matcher(&config)?;
            let client = http_client(config.http_timeout_secs)?;
            let html = load_html(&client, &source).await?;
            let mut page = HtmlFormPage::from_html(client, &source, &html)?;

            let report = FormFiller::new(&matcher)
                .fill_page(&mut page, &RecordingSink::new())
                .await?;

            if json {
                return print_json(&report);
            }
            for field in &report.filled {
                println!("✅ {} -> {} ({})", field.label, describe(&field.action), field.field);
            }
            for label in &report.skipped {
                println!("⏭️  {} (no answer)", label);
            }
            for field in &report.failed {
                println!("❌ {}: {}", field.label, field.error);
            }
            println!(
                "{} filled, {} skipped, {} failed",
                report.filled.len(),
                report.skipped.len(),
                report.failed.len()
            );
        }

        Command::Walk { sources, record } => {
            config.ensure_directories().await?;
            let matcher = load_matcher(&config)?;
            let client = http_client(config.http_timeout_secs)?;
            let page =
                HtmlFormPage::new(client).with_screenshots_dir(config.screenshots_dir.clone());

            let run_id = uuid::Uuid::new_v4();
            let sink = FanoutSink::new()
                .with(TracingSink)
                .with(JsonlSink::open(&config.events_path, run_id)?);

            // A static page never advances and nothing is sent, so one
            // unpaced step covers it.
            let mut applicant_config = config.applicant_config();
            applicant_config.wizard.max_steps = 1;
            applicant_config.wizard.pacing = Pacing::none();
            applicant_config.between_jobs = Pacing::none();
            applicant_config.dry_run = true;

            let mut applicant =
                Applicant::new(&matcher, page, sink, applicant_config).with_run_id(run_id);
            if record {
                applicant = applicant.with_history(History::open(&config.history_path)?);
            }

            let summary = applicant.apply_all(&sources).await?;

            if json {
                return print_json(&summary);
            }
            for result in &summary.results {
                println!(
                    "{} {} ({} filled, {} skipped, {} failed)",
                    result.outcome.as_str(),
                    result.job_url,
                    result.report.filled.len(),
                    result.report.skipped.len(),
                    result.report.failed.len()
                );
                if let Some(error) = &result.error {
                    println!("    {}", error);
                }
            }
            let stats = &summary.stats;
            println!(
                "Run {}: {} dry runs, {} failed, {} duplicates",
                summary.run_id, stats.dry_runs, stats.failed, stats.duplicates
            );
        }

        Command::Posting { url } => {
            let fetcher = PostingFetcher::new(http_client(config.http_timeout_secs)?);
            let posting = fetcher.fetch(&url).await?;

            if json {
                return print_json(&posting);
            }
            println!("{} at {}", posting.title, posting.company);
            if !posting.location.is_empty() {
                println!("Location: {}", posting.location);
            }
            println!("Apply: {:?}", posting.apply);
        }

        Command::SearchUrl {
            keywords,
            location,
            page,
            all,
        } => {
            let mut query = SearchQuery::new(keywords, location);
            query.easy_apply_only = !all;
            println!("{}", query.url(page)?);
        }

        Command::Jobs { source } => {
            let client = http_client(config.http_timeout_secs)?;
            let html = load_html(&client, &source).await?;
            let pages = search::result_pages(&html, config.search_page_limit)?;

            #[derive(Serialize)]
            struct JobLink {
                id: String,
                title: String,
                score: u32,
                url: String,
            }

            let jobs: Vec<JobLink> = search::job_cards(&html)?
                .into_iter()
                .map(|card| JobLink {
                    score: config.title_scorer.score(&card.title),
                    url: search::job_view_url(&card.id),
                    id: card.id,
                    title: card.title,
                })
                .filter(|job| job.score >= config.min_match_score)
                .collect();

            info!("{} jobs pass a score of {}", jobs.len(), config.min_match_score);
            if json {
                return print_json(&jobs);
            }
            for job in &jobs {
                println!("{}\t{}\t{}", job.url, job.score, job.title);
            }
            if pages > 1 {
                println!("{} result pages to visit", pages);
            }
        }

        Command::Profile { command } => match command {
            ProfileCommand::Check => {
                let matcher = load_matcher(&config)?;
                let profile = matcher.profile();

                if json {
                    return print_json(profile);
                }
                println!(
                    "✅ Profile OK: {} <{}>",
                    profile.full_name(),
                    profile.personal_info.email
                );
                println!("   Authorized to work: {}", profile.authorization_answer());
                println!("   Requires sponsorship: {}", profile.visa_answer());
                match &profile.application_settings.resume_path {
                    Some(path) if !path.exists() => {
                        println!("⚠️  Resume not found: {}", path.display())
                    }
                    Some(path) => println!("   Resume: {}", path.display()),
                    None => println!("⚠️  No resume configured"),
                }
            }
            ProfileCommand::Init { path, force } => init_profile(&path, force)?,
        },

        Command::History => {
            let history = History::open(&config.history_path)?;

            if json {
                return print_json(&history.records());
            }
            if history.records().is_empty() {
                println!("No applications recorded in {}", history.path().display());
            }
            for record in history.records() {
                println!(
                    "{}  {:<11} {:<10} {}",
                    record.timestamp.format("%Y-%m-%d %H:%M"),
                    record.outcome.as_str(),
                    record.ats,
                    record.job_url
                );
            }
        }
    }

    Ok(())
}

fn init_profile(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        error!("Refusing to overwrite {}", path.display());
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, Profile::sample().to_yaml()?)
        .with_context(|| format!("Failed to write profile: {}", path.display()))?;
    println!("✅ Wrote starter profile to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_command() {
        let cli = Cli::try_parse_from([
            "autoapply",
            "answer",
            "Gender",
            "--kind",
            "dropdown",
            "--option",
            "Male",
            "--option",
            "Female",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Answer {
                question,
                kind,
                options,
            } => {
                assert_eq!(question, "Gender");
                assert_eq!(kind, InputKind::Dropdown);
                assert_eq!(options, vec!["Male", "Female"]);
            }
            _ => panic!("expected answer command"),
        }
    }

    #[test]
    fn test_walk_requires_a_source() {
        assert!(Cli::try_parse_from(["autoapply", "walk"]).is_err());
    }

    #[test]
    fn test_init_profile_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me").join("profile.yaml");

        init_profile(&path, false).unwrap();
        assert!(Profile::load(&path).is_ok());
        assert!(init_profile(&path, false).is_err());
        assert!(init_profile(&path, true).is_ok());
    }

    #[test]
    fn test_describe_actions() {
        assert_eq!(
            describe(&FillAction::Select {
                index: 2,
                label: "No".to_string()
            }),
            "select #2 \"No\""
        );
        assert_eq!(describe(&FillAction::Check), "check");
    }
}
