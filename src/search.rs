// src/search.rs
//! Job search urls, result paging, and title screening

use anyhow::{Context, Result};
use reqwest::Url;
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::locator::clean_text;
use crate::scanner::selector;

pub const RESULTS_PER_PAGE: usize = 25;
const SEARCH_BASE: &str = "https://www.linkedin.com/jobs/search/";
const JOB_VIEW_BASE: &str = "https://www.linkedin.com/jobs/view/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
    pub easy_apply_only: bool,
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
            easy_apply_only: true,
        }
    }

    /// Url of the zero-based result page.
    pub fn url(&self, page: usize) -> Result<Url> {
        let mut params = vec![
            ("keywords", self.keywords.clone()),
            ("location", self.location.clone()),
        ];
        if self.easy_apply_only {
            params.push(("f_AL", "true".to_string()));
        }
        if page > 0 {
            params.push(("start", (page * RESULTS_PER_PAGE).to_string()));
        }
        Url::parse_with_params(SEARCH_BASE, &params).context("Failed to build search url")
    }
}

/// Pages to visit for a result count like "1,234 results", capped at `limit`.
pub fn pages_for(results_text: &str, limit: usize) -> usize {
    let digits: String = results_text
        .split_whitespace()
        .find(|word| word.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    let results: usize = digits.parse().unwrap_or(0);
    results.div_ceil(RESULTS_PER_PAGE).min(limit)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobCard {
    pub id: String,
    pub title: String,
}

const CARD_TITLE: &str =
    ".job-card-list__title, .base-search-card__title, a[class*='job-card'], h3";

const RESULT_COUNT: &str =
    ".jobs-search-results-list__subtitle, .results-context-header__job-count";

/// Job cards on a search results page, in page order without repeats.
pub fn job_cards(html: &str) -> Result<Vec<JobCard>> {
    let document = Html::parse_document(html);
    let cards = selector("[data-occludable-job-id], [data-job-id], [data-entity-urn]")?;
    let title_selector = selector(CARD_TITLE)?;

    let mut found: Vec<JobCard> = Vec::new();
    for card in document.select(&cards) {
        let element = card.value();
        let raw = element
            .attr("data-occludable-job-id")
            .or_else(|| element.attr("data-job-id"))
            .or_else(|| element.attr("data-entity-urn"))
            .unwrap_or_default();
        // "urn:li:jobPosting:123" -> "123"
        let id = raw.rsplit(':').next().unwrap_or_default().trim();
        if id.is_empty()
            || !id.chars().all(|c| c.is_ascii_digit())
            || found.iter().any(|c| c.id == id)
        {
            continue;
        }
        let title = card
            .select(&title_selector)
            .next()
            .map(|t| clean_text(&t.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        found.push(JobCard {
            id: id.to_string(),
            title,
        });
    }

    debug!("Found {} job cards", found.len());
    Ok(found)
}

/// Result pages worth visiting, from the count header on a results page.
pub fn result_pages(html: &str, limit: usize) -> Result<usize> {
    let document = Html::parse_document(html);
    let header = selector(RESULT_COUNT)?;
    Ok(document
        .select(&header)
        .next()
        .map(|h| pages_for(&clean_text(&h.text().collect::<Vec<_>>().join(" ")), limit))
        .unwrap_or(0))
}

pub fn job_view_url(id: &str) -> String {
    format!("{}{}/", JOB_VIEW_BASE, id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleKeyword {
    pub phrase: String,
    pub score: u32,
}

/// Scores job titles 0..=100 from weighted phrases, minus a penalty per
/// excluded word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleScorer {
    #[serde(default)]
    pub keywords: Vec<TitleKeyword>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_penalty")]
    pub penalty: u32,
}

fn default_penalty() -> u32 {
    30
}

impl Default for TitleScorer {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            exclude: vec![
                "intern".to_string(),
                "junior".to_string(),
                "entry level".to_string(),
            ],
            penalty: default_penalty(),
        }
    }
}

impl TitleScorer {
    pub fn score(&self, title: &str) -> u32 {
        let title = title.to_lowercase();
        let best = self
            .keywords
            .iter()
            .filter(|k| title.contains(&k.phrase.to_lowercase()))
            .map(|k| k.score)
            .max()
            .unwrap_or(0);
        let excluded = self
            .exclude
            .iter()
            .filter(|word| title.contains(&word.to_lowercase()))
            .count() as u32;
        best.saturating_sub(excluded * self.penalty).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let query = SearchQuery::new("Creative Director", "New York");
        assert_eq!(
            query.url(0).unwrap().as_str(),
            "https://www.linkedin.com/jobs/search/?keywords=Creative+Director&location=New+York&f_AL=true"
        );
        assert!(query.url(2).unwrap().as_str().ends_with("&start=50"));

        let mut open = SearchQuery::new("C++ dev", "");
        open.easy_apply_only = false;
        let url = open.url(0).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.linkedin.com/jobs/search/?keywords=C%2B%2B+dev&location="
        );
        let keywords = url.query_pairs().find(|(k, _)| k == "keywords").unwrap().1;
        assert_eq!(keywords, "C++ dev");
    }

    #[test]
    fn test_pages_for() {
        assert_eq!(pages_for("1,234 results", 3), 3);
        assert_eq!(pages_for("30 results", 10), 2);
        assert_eq!(pages_for("25 results", 10), 1);
        assert_eq!(pages_for("No matching jobs found", 10), 0);
    }

    #[test]
    fn test_job_cards() {
        let html = r#"<div>
          <div class="jobs-search-results-list__subtitle"><span>1,234 results</span></div>
          <ul>
            <li data-occludable-job-id="3812345678">
              <a class="job-card-list__title">Creative Director</a>
            </li>
            <li><div data-job-id="3812345679"><h3> Art Director </h3></div></li>
            <li><div class="base-card" data-entity-urn="urn:li:jobPosting:3812345680"></div></li>
            <li data-occludable-job-id="3812345678"></li>
            <li data-occludable-job-id="search"></li>
          </ul>
        </div>"#;
        let cards = job_cards(html).unwrap();
        let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3812345678", "3812345679", "3812345680"]);
        assert_eq!(cards[0].title, "Creative Director");
        assert_eq!(cards[1].title, "Art Director");
        assert_eq!(cards[2].title, "");

        assert_eq!(result_pages(html, 3).unwrap(), 3);
        assert_eq!(result_pages("<p>nothing</p>", 3).unwrap(), 0);
        assert_eq!(
            job_view_url("3812345678"),
            "https://www.linkedin.com/jobs/view/3812345678/"
        );
    }

    #[test]
    fn test_title_scorer() {
        let scorer = TitleScorer {
            keywords: vec![
                TitleKeyword {
                    phrase: "creative director".to_string(),
                    score: 100,
                },
                TitleKeyword {
                    phrase: "art director".to_string(),
                    score: 80,
                },
            ],
            ..TitleScorer::default()
        };
        assert_eq!(scorer.score("Associate Creative Director"), 100);
        assert_eq!(scorer.score("Junior Art Director"), 50);
        assert_eq!(scorer.score("Intern, Junior Art Director"), 20);
        assert_eq!(scorer.score("Accountant"), 0);
    }
}
