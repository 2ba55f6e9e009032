use anyhow::Result;
use reqwest::Client;
use std::path::Path;

pub mod applicant;
pub mod cli;
pub mod config;
pub mod events;
pub mod filler;
pub mod history;
pub mod locator;
pub mod matcher;
pub mod page;
pub mod posting;
pub mod profile;
pub mod scanner;
pub mod search;
pub mod timing;
pub mod types;
pub mod wizard;

pub use applicant::{Applicant, ApplicantConfig, ApplicationResult, SessionSummary};
pub use config::RunConfig;
pub use events::{ApplicationEvent, EventSink};
pub use matcher::{Answer, Matcher};
pub use page::{FormPage, HtmlFormPage};
pub use profile::{Profile, ProfileField};
pub use types::{FormQuestion, InputKind};
pub use wizard::{Wizard, WizardConfig, WizardOutcome};

/// Convenience function for answering one question from a profile file
pub fn answer_question(profile_path: &Path, question: &str) -> Result<Option<Answer>> {
    let matcher = Matcher::new(Profile::load(profile_path)?);
    Ok(matcher.resolve(question))
}

/// Fill a saved form page without submitting it, returning what was done
pub async fn plan_form(
    client: Client,
    profile_path: &Path,
    url: &str,
    html: &str,
) -> Result<types::FillReport> {
    let matcher = Matcher::new(Profile::load(profile_path)?);
    let mut page = HtmlFormPage::from_html(client, url, html)?;
    filler::FormFiller::new(&matcher)
        .fill_page(&mut page, &events::RecordingSink::new())
        .await
}
