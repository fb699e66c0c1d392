use anyhow::{Context, Result};
use common::{ExtractConfig, FetchConfig};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Article body extracted from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source URL
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// What happened when an article URL was scraped
#[derive(Debug)]
pub enum ScrapeOutcome {
    Extracted(Document),
    /// Transport error or non-success status
    FetchFailed { url: String, reason: String },
    /// The page was fetched but no body container with text was found
    NoContent { url: String, html: String },
}

/// Which header set a request is sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    Primary,
    /// Alternate accept headers, used once after a 403
    Fallback,
}

/// HTTP client carrying the configured headers and politeness delays
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("invalid fetch.user_agent header value")?,
        );
        if let Some(referer) = &config.referer {
            headers.insert(
                REFERER,
                HeaderValue::from_str(referer).context("invalid fetch.referer header value")?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Send a GET and return status and body, whatever the status.
    pub async fn send(&self, url: &str, profile: HeaderProfile) -> Result<(StatusCode, String)> {
        let (accept, accept_language) = match profile {
            HeaderProfile::Primary => (&self.config.accept, &self.config.accept_language),
            HeaderProfile::Fallback => (&self.config.fallback_accept, &self.config.fallback_accept_language),
        };

        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept.as_str())
            .header(ACCEPT_LANGUAGE, accept_language.as_str())
            .send()
            .await
            .with_context(|| format!("failed to fetch {}", url))?;

        let status = response.status();
        let body = response.text().await.context("failed to read response body")?;
        Ok((status, body))
    }

    /// Fetch a page, treating any non-success status as an error.
    pub async fn get_html(&self, url: &str) -> Result<String> {
        let (status, body) = self.send(url, HeaderProfile::Primary).await?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("fetch of {} failed with status: {}", url, status));
        }
        Ok(body)
    }

    /// Sleep for a random interval within the configured delay bounds.
    pub async fn polite_pause(&self) {
        let (min, max) = (self.config.min_delay_ms, self.config.max_delay_ms);
        if max == 0 {
            return;
        }
        let delay = if min >= max {
            max
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        debug!(delay_ms = delay, "politeness pause");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

/// Compiled selectors for body and title extraction
#[derive(Debug, Clone)]
pub struct ExtractRules {
    body: Vec<(String, Selector)>,
    title: Vec<Selector>,
    paragraph: Selector,
}

impl ExtractRules {
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        let body = config
            .body_selectors
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| Ok((s.clone(), parse_selector(s)?)))
            .collect::<Result<Vec<_>>>()?;
        let title = config
            .title_selectors
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            body,
            title,
            paragraph: parse_selector("p")?,
        })
    }
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow::anyhow!("invalid CSS selector '{}': {:?}", selector, e))
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Elements whose boundaries separate words; everything else is inline.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Elements whose text is never article content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text of `element` with whitespace normalized.
///
/// Text nodes are concatenated as they are, so inline markup (`<b>un</b>believable`) does not
/// split words; block elements and `<br>` are separated by a space.
fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    normalize_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push(' ');
            }
            collect_text(child, out);
            if block {
                out.push(' ');
            }
        }
    }
}

/// Text of the paragraphs inside `element`, or all of its text when the paragraphs hold less
/// than half of it (a captioned figure in a `<div>`-structured body, say).
fn body_text(element: ElementRef<'_>, paragraph: &Selector) -> String {
    let paragraphs: Vec<String> = element
        .select(paragraph)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    let whole = element_text(element);
    let covered: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
    if paragraphs.is_empty() || covered * 2 < whole.chars().count() {
        whole
    } else {
        paragraphs.join(" ")
    }
}

/// Extract the article body and title from raw markup.
///
/// The body is the first element matching one of the body selectors (tried in order) that
/// has any text. Returns `None` when no such element exists.
pub fn extract_document(html: &str, url: &str, rules: &ExtractRules) -> Option<Document> {
    let document = Html::parse_document(html);

    let text = rules.body.iter().find_map(|(name, selector)| {
        let text = document
            .select(selector)
            .next()
            .map(|element| body_text(element, &rules.paragraph))
            .filter(|t| !t.is_empty())?;
        debug!(selector = %name, chars = text.len(), "body container found");
        Some(text)
    })?;

    let title = rules.title.iter().find_map(|selector| {
        document
            .select(selector)
            .map(element_text)
            .find(|t| !t.is_empty())
    });

    Some(Document {
        url: url.to_string(),
        title,
        text,
    })
}

/// Fetch an article page and extract its body.
pub async fn scrape_article(fetcher: &Fetcher, rules: &ExtractRules, url: &str) -> ScrapeOutcome {
    let html = match fetcher.get_html(url).await {
        Ok(html) => html,
        Err(e) => {
            return ScrapeOutcome::FetchFailed {
                url: url.to_string(),
                reason: format!("{:#}", e),
            }
        }
    };

    match extract_document(&html, url, rules) {
        Some(document) => {
            info!(%url, chars = document.text.len(), "scraping: extracted article body");
            ScrapeOutcome::Extracted(document)
        }
        None => ScrapeOutcome::NoContent {
            url: url.to_string(),
            html,
        },
    }
}

/// Write raw HTML into the debug directory for later inspection.
pub async fn save_debug_html(dir: &Path, file_name: &str, html: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create debug directory: {}", dir.display()))?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, html)
        .await
        .with_context(|| format!("failed to write debug file: {}", path.display()))?;
    warn!(path = %path.display(), "saved page for debugging");
    Ok(path)
}
