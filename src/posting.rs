// src/posting.rs
//! Fetching a job posting and working out where its application lives

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::locator::clean_text;
use crate::page::fetch_html;
use crate::types::PageButton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsKind {
    Linkedin,
    Greenhouse,
    Lever,
    Workday,
    Other,
}

impl AtsKind {
    pub fn detect(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("greenhouse.io") {
            AtsKind::Greenhouse
        } else if url.contains("lever.co") {
            AtsKind::Lever
        } else if url.contains("myworkdayjobs.com") || url.contains("workday") {
            AtsKind::Workday
        } else if url.contains("linkedin.com") {
            AtsKind::Linkedin
        } else {
            AtsKind::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AtsKind::Linkedin => "linkedin",
            AtsKind::Greenhouse => "greenhouse",
            AtsKind::Lever => "lever",
            AtsKind::Workday => "workday",
            AtsKind::Other => "other",
        }
    }
}

impl fmt::Display for AtsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplyTarget {
    /// Same-site wizard on the posting page itself.
    EasyApply,
    External { url: String, ats: AtsKind },
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct Posting {
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub apply: ApplyTarget,
}

const LINKEDIN_TITLE: &[&str] = &[
    "h1.top-card-layout__title",
    ".job-details-jobs-unified-top-card__job-title",
    "h1[data-test-id='job-title']",
    ".jobs-unified-top-card__job-title",
];

const LINKEDIN_COMPANY: &[&str] = &[
    ".job-details-jobs-unified-top-card__company-name",
    ".topcard__org-name-link",
    "a[data-test-id='job-poster-name']",
    ".jobs-unified-top-card__company-name",
];

const LINKEDIN_LOCATION: &[&str] = &[
    ".job-details-jobs-unified-top-card__bullet",
    ".topcard__flavor--bullet",
    "[data-test-id='job-location']",
    ".jobs-unified-top-card__bullet",
];

const LINKEDIN_DESCRIPTION: &[&str] = &[
    ".jobs-box__html-content",
    ".jobs-description__container",
    ".jobs-description-content__text",
    ".show-more-less-html__markup",
    "[data-test-id='job-description']",
];

const GENERIC_TITLE: &[&str] = &[
    "h1",
    "[class*='job-title']",
    "[class*='title']",
    "[class*='position']",
];

const GENERIC_COMPANY: &[&str] = &[
    "[class*='company']",
    "[class*='employer']",
    "[class*='organization']",
];

const GENERIC_LOCATION: &[&str] = &["[class*='location']"];

const GENERIC_DESCRIPTION: &[&str] = &[
    "[class*='description']",
    "#content",
    "[class*='content']",
    "main",
    "article",
];

/// Links that lead off-site to the employer's application form.
const EXTERNAL_APPLY: &[&str] = &[
    "a[data-tracking-control-name*='apply']",
    "a.apply-button",
    "a[href*='greenhouse.io']",
    "a[href*='lever.co']",
    "a[href*='myworkdayjobs.com']",
];

fn find_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .filter_map(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| clean_text(&element.text().collect::<Vec<_>>().join(" ")))
        })
        .find(|text| !text.is_empty())
}

fn is_easy_apply(document: &Html) -> bool {
    let Ok(selector) = Selector::parse("button, a") else {
        return false;
    };
    document.select(&selector).any(|element| {
        let text = clean_text(&element.text().collect::<Vec<_>>().join(" ")).to_lowercase();
        let aria = element
            .value()
            .attr("aria-label")
            .unwrap_or_default()
            .to_lowercase();
        text.contains("easy apply") || aria.contains("easy apply")
    })
}

fn external_apply_url(document: &Html) -> Option<String> {
    EXTERNAL_APPLY
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| href.starts_with("http"))
                .map(str::to_string)
        })
}

fn apply_target(url: &str, document: &Html) -> ApplyTarget {
    let ats = AtsKind::detect(url);
    if ats != AtsKind::Linkedin && ats != AtsKind::Other {
        return ApplyTarget::External {
            url: url.to_string(),
            ats,
        };
    }
    if is_easy_apply(document) {
        return ApplyTarget::EasyApply;
    }
    match external_apply_url(document) {
        Some(href) => ApplyTarget::External {
            ats: AtsKind::detect(&href),
            url: href,
        },
        None => ApplyTarget::Unknown,
    }
}

/// The control that leads from a job page into its application, and where it
/// goes. On-site controls are preferred over links to another site.
pub fn apply_entry(buttons: &[PageButton]) -> Option<(ApplyTarget, &PageButton)> {
    let entries: Vec<&PageButton> = buttons
        .iter()
        .filter(|b| b.enabled && b.text.to_lowercase().contains("apply"))
        .collect();

    let on_site = entries
        .iter()
        .find(|b| b.href.as_deref().map_or(true, |h| !h.starts_with("http")));
    if let Some(button) = on_site {
        return Some((ApplyTarget::EasyApply, *button));
    }

    entries.into_iter().find_map(|button| {
        let url = button.href.clone()?;
        Some((
            ApplyTarget::External {
                ats: AtsKind::detect(&url),
                url,
            },
            button,
        ))
    })
}

fn parse_with(
    document: &Html,
    title: &[&str],
    company: &[&str],
    location: &[&str],
    description: &[&str],
) -> Option<(String, String, String, String)> {
    Some((
        find_text(document, title)?,
        find_text(document, company).unwrap_or_default(),
        find_text(document, location).unwrap_or_default(),
        find_text(document, description)?,
    ))
}

/// Parse a posting page, trying the professional-network layout before
/// generic job-board selectors.
pub fn parse_posting(url: &str, html: &str) -> Result<Posting> {
    let document = Html::parse_document(html);

    let (title, company, location, description) = parse_with(
        &document,
        LINKEDIN_TITLE,
        LINKEDIN_COMPANY,
        LINKEDIN_LOCATION,
        LINKEDIN_DESCRIPTION,
    )
    .or_else(|| {
        warn!("Falling back to generic posting selectors");
        parse_with(
            &document,
            GENERIC_TITLE,
            GENERIC_COMPANY,
            GENERIC_LOCATION,
            GENERIC_DESCRIPTION,
        )
    })
    .context("Failed to extract job posting from page")?;

    Ok(Posting {
        url: url.to_string(),
        title,
        company,
        location,
        description,
        apply: apply_target(url, &document),
    })
}

pub struct PostingFetcher {
    client: Client,
}

impl PostingFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<Posting> {
        let html = fetch_html(&self.client, url).await?;
        let posting = parse_posting(url, &html)?;
        info!(
            "Extracted posting: {} at {} ({:?})",
            posting.title, posting.company, posting.apply
        );
        Ok(posting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKEDIN_POSTING: &str = r#"<html><body>
        <h1 class="top-card-layout__title">Senior Rust Engineer</h1>
        <a class="topcard__org-name-link">Acme</a>
        <span class="topcard__flavor--bullet"> Berlin, Germany </span>
        <div class="show-more-less-html__markup">
          <p>Build distributed systems.</p>
          <p>5+ years of experience.</p>
        </div>
        <button class="jobs-apply-button">
          <span>Easy Apply</span>
        </button>
    </body></html>"#;

    const EXTERNAL_POSTING: &str = r#"<html><body>
        <h1 class="top-card-layout__title">Platform Engineer</h1>
        <div class="jobs-description__container">Run the platform.</div>
        <a class="apply-button" href="https://boards.greenhouse.io/acme/jobs/42">Apply</a>
    </body></html>"#;

    const CAREERS_PAGE: &str = r#"<html><body>
        <main>
          <h1>Backend Developer</h1>
          <div class="company-name">Globex</div>
          <div class="location">Remote</div>
          <div class="job-description">Write services in Rust.</div>
        </main>
    </body></html>"#;

    #[test]
    fn test_apply_entry() {
        let buttons = vec![
            PageButton::new("Save"),
            PageButton::new("Apply on company website")
                .with_href("https://boards.greenhouse.io/acme/jobs/42"),
            PageButton::new("Easy Apply"),
        ];
        let (target, button) = apply_entry(&buttons).unwrap();
        assert_eq!(target, ApplyTarget::EasyApply);
        assert_eq!(button.text, "Easy Apply");

        let (target, _) = apply_entry(&buttons[..2]).unwrap();
        assert_eq!(
            target,
            ApplyTarget::External {
                url: "https://boards.greenhouse.io/acme/jobs/42".to_string(),
                ats: AtsKind::Greenhouse,
            }
        );

        assert!(apply_entry(&[PageButton::new("Easy Apply").disabled()]).is_none());
    }

    #[test]
    fn test_detect_ats() {
        assert_eq!(
            AtsKind::detect("https://boards.greenhouse.io/acme/jobs/1"),
            AtsKind::Greenhouse
        );
        assert_eq!(AtsKind::detect("https://jobs.lever.co/acme/abc"), AtsKind::Lever);
        assert_eq!(
            AtsKind::detect("https://acme.wd5.myworkdayjobs.com/en-US/careers/job/1"),
            AtsKind::Workday
        );
        assert_eq!(
            AtsKind::detect("https://www.linkedin.com/jobs/view/123"),
            AtsKind::Linkedin
        );
        assert_eq!(AtsKind::detect("https://acme.example/careers"), AtsKind::Other);
    }

    #[test]
    fn test_parse_easy_apply_posting() {
        let posting =
            parse_posting("https://www.linkedin.com/jobs/view/123", LINKEDIN_POSTING).unwrap();
        assert_eq!(posting.title, "Senior Rust Engineer");
        assert_eq!(posting.company, "Acme");
        assert_eq!(posting.location, "Berlin, Germany");
        assert_eq!(
            posting.description,
            "Build distributed systems. 5+ years of experience."
        );
        assert_eq!(posting.apply, ApplyTarget::EasyApply);
    }

    #[test]
    fn test_parse_external_apply_link() {
        let posting =
            parse_posting("https://www.linkedin.com/jobs/view/456", EXTERNAL_POSTING).unwrap();
        assert_eq!(posting.company, "");
        assert_eq!(
            posting.apply,
            ApplyTarget::External {
                url: "https://boards.greenhouse.io/acme/jobs/42".to_string(),
                ats: AtsKind::Greenhouse,
            }
        );
    }

    #[test]
    fn test_generic_fallback() {
        let posting = parse_posting("https://globex.example/jobs/7", CAREERS_PAGE).unwrap();
        assert_eq!(posting.title, "Backend Developer");
        assert_eq!(posting.company, "Globex");
        assert_eq!(posting.location, "Remote");
        assert_eq!(posting.description, "Write services in Rust.");
        assert_eq!(posting.apply, ApplyTarget::Unknown);
    }

    #[test]
    fn test_ats_url_is_its_own_target() {
        let posting =
            parse_posting("https://jobs.lever.co/acme/abc", CAREERS_PAGE).unwrap();
        assert_eq!(
            posting.apply,
            ApplyTarget::External {
                url: "https://jobs.lever.co/acme/abc".to_string(),
                ats: AtsKind::Lever,
            }
        );
    }

    #[test]
    fn test_page_without_posting_is_an_error() {
        assert!(parse_posting("https://x.example", "<html><body></body></html>").is_err());
    }
}
