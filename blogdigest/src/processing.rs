use anyhow::{Context, Result};
use chrono::Local;
use common::{Config, OutputConfig, SummaryBackend};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::llm::{self, summarizer::{Summarizer, SummaryMethod, SummaryOutcome}};
use crate::nlp::{ExtractiveSummarizer, StopwordFilter};
use crate::scraping::{self, ExtractRules, Fetcher, ScrapeOutcome};
use crate::storage::{self, Post};

/// What happened to a single URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleResult {
    /// A post was written (or rendered, in dry-run mode)
    Saved {
        path: Option<PathBuf>,
        /// `None` when the placeholder text was used
        method: Option<SummaryMethod>,
    },
    FetchFailed,
    PersistFailed,
}

/// Tally of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub saved: usize,
    /// Saved with the placeholder summary
    pub placeholders: usize,
    pub fetch_failures: usize,
    pub extraction_failures: usize,
    pub persist_failures: usize,
    pub files: Vec<PathBuf>,
}

/// Sequential fetch → extract → summarize → persist driver
pub struct Pipeline {
    fetcher: Fetcher,
    rules: ExtractRules,
    summarizer: Summarizer,
    output: OutputConfig,
    output_dir: PathBuf,
    placeholder: String,
    debug_dir: Option<PathBuf>,
    dry_run: bool,
}

impl Pipeline {
    /// Build every collaborator from configuration. Errors here are fatal.
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self> {
        let stopwords = StopwordFilter::load(
            &config.summary.language,
            config.summary.stopwords_file.as_deref().map(std::path::Path::new),
        );
        let extractive = ExtractiveSummarizer::new(stopwords, config.summary.sentences);
        info!(
            backend = %config.summary.backend,
            sentences = extractive.sentence_count(),
            language = %config.summary.language,
            "summarizer configured"
        );

        let summarizer = match config.summary.backend {
            SummaryBackend::Extractive => Summarizer::extractive(extractive),
            SummaryBackend::Llm => {
                let provider = llm::create_provider(&config.llm).context("failed to initialize LLM provider")?;
                info!(model = provider.model(), "LLM summarization enabled");
                Summarizer::with_llm(
                    extractive,
                    provider,
                    config.summary.max_input_chars,
                    config.summary.fallback_to_extractive,
                )
            }
        };

        Ok(Self {
            fetcher: Fetcher::new(&config.fetch)?,
            rules: ExtractRules::from_config(&config.extract)?,
            summarizer,
            output: config.output.clone(),
            output_dir: PathBuf::from(&config.output.dir),
            placeholder: config.summary.placeholder.clone(),
            debug_dir: config.extract.debug_dir.as_ref().map(PathBuf::from),
            dry_run,
        })
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Process every URL in order. Individual failures are logged and counted, never returned.
    pub async fn process_urls(&self, urls: &[String]) -> BatchReport {
        let mut report = BatchReport::default();
        info!(count = urls.len(), "processing articles");

        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                self.fetcher.polite_pause().await;
            }
            report.attempted += 1;

            match self.process_url(url, &mut report).await {
                ArticleResult::Saved { path, method } => {
                    report.saved += 1;
                    if method.is_none() {
                        report.placeholders += 1;
                    }
                    report.files.extend(path);
                }
                ArticleResult::FetchFailed => report.fetch_failures += 1,
                ArticleResult::PersistFailed => report.persist_failures += 1,
            }
        }

        info!(
            attempted = report.attempted,
            saved = report.saved,
            placeholders = report.placeholders,
            fetch_failures = report.fetch_failures,
            extraction_failures = report.extraction_failures,
            persist_failures = report.persist_failures,
            "run complete"
        );
        report
    }

    async fn process_url(&self, url: &str, report: &mut BatchReport) -> ArticleResult {
        let (title, summary) = match scraping::scrape_article(&self.fetcher, &self.rules, url).await {
            ScrapeOutcome::FetchFailed { url, reason } => {
                error!(%url, %reason, "error fetching article, skipping");
                return ArticleResult::FetchFailed;
            }
            ScrapeOutcome::NoContent { url, html } => {
                warn!(%url, "content container not found, page structure may have changed");
                report.extraction_failures += 1;
                self.dump_page(&url, &html).await;
                (None, SummaryOutcome::Empty)
            }
            ScrapeOutcome::Extracted(document) => {
                let summary = self.summarizer.summarize(&document.text).await;
                (document.title, summary)
            }
        };

        let method = match &summary {
            SummaryOutcome::Generated { method, .. } => Some(*method),
            SummaryOutcome::Empty => None,
        };
        let body = match (summary.text(), method) {
            (Some(text), Some(method)) => {
                info!(%url, %method, chars = text.chars().count(), "summary generated");
                text
            }
            _ => {
                warn!(%url, "no summary produced, saving placeholder");
                self.placeholder.as_str()
            }
        };

        let created = Local::now();
        let post = Post::new(&self.output, title.as_deref(), url, body, created);
        match self.persist(&post, created).await {
            Ok(path) => ArticleResult::Saved { path, method },
            Err(e) => {
                error!(%url, error = %format!("{:#}", e), "failed to save post");
                ArticleResult::PersistFailed
            }
        }
    }

    async fn persist(&self, post: &Post, created: chrono::DateTime<Local>) -> Result<Option<PathBuf>> {
        let contents = post.render()?;
        if self.dry_run {
            info!(link = %post.front_matter.link, "dry run, post not written:\n{}", contents);
            return Ok(None);
        }
        let stem = storage::file_stem(self.output.naming, created, &post.front_matter.title);
        let path = storage::write_post(&self.output_dir, &stem, &contents).await?;
        Ok(Some(path))
    }

    async fn dump_page(&self, url: &str, html: &str) {
        let Some(dir) = &self.debug_dir else {
            return;
        };
        // slugify caps the length, so long URLs can share a slug
        let name = format!("debug_page_{}_{}.html", storage::slugify(url), rand::random::<u32>());
        if let Err(e) = scraping::save_debug_html(dir, &name, html).await {
            warn!(error = %e, "failed to save debug page");
        }
    }
}
