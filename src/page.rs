// src/page.rs
//! The page capability the filler and wizard drive, and a static-HTML
//! implementation of it that records actions instead of performing them

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::scanner::{self, FormScan};
use crate::types::{FillAction, PageButton, PageField, PageSnapshot};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// What an automation backend must offer to have forms filled on it.
#[allow(async_fn_in_trait)]
pub trait FormPage {
    async fn open(&mut self, url: &str) -> Result<()>;

    async fn fields(&mut self) -> Result<Vec<PageField>>;

    async fn fill(&mut self, field: &PageField, action: &FillAction) -> Result<()>;

    async fn buttons(&mut self) -> Result<Vec<PageButton>>;

    async fn click(&mut self, button: &PageButton) -> Result<()>;

    async fn snapshot(&mut self) -> Result<PageSnapshot>;

    /// Capture the page for later inspection. `None` when capturing is off.
    async fn screenshot(&mut self, name: &str) -> Result<Option<PathBuf>>;
}

pub fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    info!("Fetching page: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP error {} for {}", response.status(), url);
    }

    response
        .text()
        .await
        .context("Failed to read response body")
}

/// Load HTML from an http(s) URL or a local file path.
pub async fn load_html(client: &Client, source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_html(client, source).await
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read HTML file: {}", source))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedFill {
    pub selector: Option<String>,
    pub label: String,
    pub action: FillAction,
}

/// Dry-run page over a static HTML snapshot.
pub struct HtmlFormPage {
    client: Client,
    url: String,
    html: String,
    scan: FormScan,
    screenshots_dir: Option<PathBuf>,
    fills: Vec<RecordedFill>,
    clicks: Vec<String>,
}

impl HtmlFormPage {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: String::new(),
            html: String::new(),
            scan: FormScan::default(),
            screenshots_dir: None,
            fills: Vec::new(),
            clicks: Vec::new(),
        }
    }

    pub fn with_screenshots_dir(mut self, dir: PathBuf) -> Self {
        self.screenshots_dir = Some(dir);
        self
    }

    pub fn from_html(client: Client, url: &str, html: &str) -> Result<Self> {
        let mut page = Self::new(client);
        page.load(url, html.to_string())?;
        Ok(page)
    }

    fn load(&mut self, url: &str, html: String) -> Result<()> {
        self.scan = scanner::scan_document(&html)?;
        self.url = url.to_string();
        self.html = html;
        self.fills.clear();
        self.clicks.clear();
        Ok(())
    }

    pub fn recorded_fills(&self) -> &[RecordedFill] {
        &self.fills
    }

    pub fn recorded_clicks(&self) -> &[String] {
        &self.clicks
    }

    fn has_field(&self, field: &PageField) -> bool {
        self.scan
            .fields
            .iter()
            .any(|f| f.locator == field.locator && f.question.label == field.question.label)
    }
}

impl FormPage for HtmlFormPage {
    async fn open(&mut self, url: &str) -> Result<()> {
        let html = load_html(&self.client, url).await?;
        self.load(url, html)
    }

    async fn fields(&mut self) -> Result<Vec<PageField>> {
        Ok(self.scan.fields.clone())
    }

    async fn fill(&mut self, field: &PageField, action: &FillAction) -> Result<()> {
        if !self.has_field(field) {
            anyhow::bail!("Field '{}' is not on this page", field.question.label);
        }
        if let FillAction::Upload { path } = action {
            if !path.exists() {
                anyhow::bail!("Upload file not found: {}", path.display());
            }
        }
        self.fills.push(RecordedFill {
            selector: field.locator.selector.clone(),
            label: field.question.label.clone(),
            action: action.clone(),
        });
        Ok(())
    }

    async fn buttons(&mut self) -> Result<Vec<PageButton>> {
        Ok(self.scan.buttons.clone())
    }

    async fn click(&mut self, button: &PageButton) -> Result<()> {
        if !button.enabled {
            anyhow::bail!("Button '{}' is disabled", button.text);
        }
        self.clicks.push(button.text.clone());
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot> {
        scanner::snapshot(&self.url, &self.html)
    }

    async fn screenshot(&mut self, name: &str) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.screenshots_dir else {
            return Ok(None);
        };
        let path = snapshot_path(dir, name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        tokio::fs::write(&path, &self.html)
            .await
            .with_context(|| format!("Failed to write page capture: {}", path.display()))?;
        info!("Saved page capture: {}", path.display());
        Ok(Some(path))
    }
}

fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    let safe: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!(
        "{}_{}.html",
        safe,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ))
}
