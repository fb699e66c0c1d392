/*
blogdigest - main.rs
Collects article links (from a blog listing page or the command line), summarizes each
article and writes it out as a post with TOML front matter. One batch per invocation.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::{Config, SummaryBackend};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use blogdigest::ingestion;
use blogdigest::processing::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "blogdigest", about = "Summarize blog articles into static-site posts")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Article URL to process instead of the listing page (repeatable)
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// File with one article URL per line
    #[arg(long, value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// Override output.dir
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Override summary.sentences
    #[arg(long)]
    sentences: Option<usize>,

    /// Override summary.language (stopword language code)
    #[arg(long)]
    language: Option<String>,

    /// Override summary.backend (extractive, llm)
    #[arg(long)]
    backend: Option<SummaryBackend>,

    /// Log rendered posts instead of writing them
    #[arg(long)]
    dry_run: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(k) = self.sentences {
            config.summary.sentences = k;
        }
        if let Some(language) = &self.language {
            config.summary.language = language.clone();
        }
        if let Some(backend) = self.backend {
            config.summary.backend = backend;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    if let Err(e) = run(args).await {
        error!(error = %format!("{:#}", e), "run aborted");
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");
    let override_path = match &args.config {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found: {}", p.display());
            }
            Some(p.clone())
        }
        None => Some(PathBuf::from("config.toml")),
    };

    let mut config = Config::load_with_defaults(Some(default_path.as_path()), override_path.as_deref()).await?;
    args.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;
    info!(
        default = ?default_path,
        config_file = ?override_path,
        backend = %config.summary.backend,
        sentences = config.summary.sentences,
        "configuration loaded"
    );

    let pipeline = Pipeline::from_config(&config, args.dry_run)?;
    let debug_dir = config.extract.debug_dir.as_ref().map(PathBuf::from);

    let base = config
        .source
        .listing_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("invalid listing URL")?;

    let mut urls: Vec<String> = args
        .urls
        .iter()
        .filter_map(|u| ingestion::resolve_link(base.as_ref(), u))
        .collect();
    if let Some(path) = &args.urls_file {
        urls.extend(ingestion::read_url_list(path, base.as_ref()).await?);
    }

    let explicit = !args.urls.is_empty() || args.urls_file.is_some();
    if !explicit {
        urls = ingestion::discover_article_links(pipeline.fetcher(), &config.source, debug_dir.as_deref())
            .await
            .context("failed to collect article links")?;
    }

    if urls.len() > config.source.max_articles {
        warn!(
            given = urls.len(),
            max = config.source.max_articles,
            "more URLs than source.max_articles, truncating"
        );
        urls.truncate(config.source.max_articles);
    }
    if urls.is_empty() {
        warn!("no article URLs to process");
        return Ok(());
    }

    let report = pipeline.process_urls(&urls).await;
    info!(
        saved = report.saved,
        failed = report.fetch_failures + report.persist_failures,
        "finished"
    );
    Ok(())
}
