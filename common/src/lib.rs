/*!
common/src/lib.rs

Shared configuration types for blogdigest.

This file provides:
- Config data structures (deserialized from TOML, every field defaulted)
- Async loaders for a single TOML file or a default + override pair
- Validation of the values the pipeline cannot work around
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Where the input URLs come from when none are given on the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Blog index page whose article links are collected
    pub listing_url: Option<String>,
    /// CSS selector matching the article anchors on the listing page
    pub link_selector: String,
    /// Upper bound on the number of articles processed per run
    pub max_articles: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: None,
            link_selector: "div.post-list-item a.post-link".to_string(),
            max_articles: 10,
        }
    }
}

/// HTTP fetching / politeness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: Option<String>,
    /// Headers used for the single retry after a 403 on the listing page
    pub fallback_accept: String,
    pub fallback_accept_language: String,
    /// Random pause before the listing fetch and between articles
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            referer: None,
            fallback_accept: "application/json".to_string(),
            fallback_accept_language: "en-US,en;q=0.9".to_string(),
            min_delay_ms: 1000,
            max_delay_ms: 3000,
        }
    }
}

/// Article body / title extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Tried in order; the first matching element is the article body
    pub body_selectors: Vec<String>,
    pub title_selectors: Vec<String>,
    /// When set, pages without a body container are dumped here
    pub debug_dir: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            body_selectors: vec!["article".to_string(), "div.content-body".to_string()],
            title_selectors: vec!["h1".to_string(), "title".to_string()],
            debug_dir: None,
        }
    }
}

/// Which summarizer produces the post body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryBackend {
    Extractive,
    Llm,
}

impl FromStr for SummaryBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "extractive" => Ok(Self::Extractive),
            "llm" => Ok(Self::Llm),
            other => anyhow::bail!("unknown summary backend '{}' (expected 'extractive' or 'llm')", other),
        }
    }
}

impl fmt::Display for SummaryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extractive => f.write_str("extractive"),
            Self::Llm => f.write_str("llm"),
        }
    }
}

/// Summarization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub backend: SummaryBackend,
    /// Number of sentences kept by the extractive summarizer
    pub sentences: usize,
    /// Stopword language code ("en", "fr", ...)
    pub language: String,
    /// Optional replacement stopword list, one word per line
    pub stopwords_file: Option<String>,
    /// Body written when no summary could be produced
    pub placeholder: String,
    /// Article text is cut to this many characters before it is sent to an LLM
    pub max_input_chars: usize,
    pub fallback_to_extractive: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            backend: SummaryBackend::Extractive,
            sentences: 3,
            language: "en".to_string(),
            stopwords_file: None,
            placeholder: "Summary unavailable.".to_string(),
            max_input_chars: 2000,
            fallback_to_extractive: true,
        }
    }
}

/// Wire protocol of the text-generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmAdapter {
    /// Ollama `/api/generate`
    Ollama,
    /// OpenAI-compatible `/chat/completions`
    Openai,
}

/// Text-generation service config (used if `summary.backend = "llm"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub adapter: LlmAdapter,
    pub api_url: String,
    /// Name of the environment variable holding the API key (openai adapter)
    pub api_key_env: Option<String>,
    pub model: String,
    /// `{article}` is replaced with the article text; appended if absent
    pub prompt: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            adapter: LlmAdapter::Ollama,
            api_url: "http://localhost:11434/api/generate".to_string(),
            api_key_env: None,
            model: "deepseek-r1:7b".to_string(),
            prompt: "Summarize the following article in detail. Do not write from a third-person \
                     perspective. Highlight the key innovations and their significance. Do not show \
                     your reasoning, output only the summary:\n\n{article}"
                .to_string(),
            temperature: 0.5,
            timeout_seconds: 120,
            max_tokens: 1024,
        }
    }
}

/// How post files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileNaming {
    /// `YYYYMMDD_<random u32>.md`
    Random,
    /// `YYYYMMDD_<title-slug>.md`
    Title,
}

/// Post output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub naming: FileNaming,
    /// Front matter title used when the page has none
    pub default_title: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub draft: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "content/posts".to_string(),
            naming: FileNaming::Random,
            default_title: "Article Summary".to_string(),
            tags: Vec::new(),
            categories: Vec::new(),
            draft: false,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub summary: SummaryConfig,
    pub llm: LlmConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::from_toml_str(&data)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(data: &str) -> Result<Self> {
        toml::from_str(data).context("Failed to parse TOML configuration")
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing files are
    /// skipped, so with neither present the built-in defaults are returned.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(listing) = &self.source.listing_url {
            url::Url::parse(listing)
                .with_context(|| format!("source.listing_url is not a valid URL: {}", listing))?;
        }
        if self.source.link_selector.trim().is_empty() {
            anyhow::bail!("source.link_selector must not be empty");
        }
        if self.fetch.timeout_seconds == 0 {
            anyhow::bail!("fetch.timeout_seconds must be greater than zero");
        }
        if self.fetch.min_delay_ms > self.fetch.max_delay_ms {
            anyhow::bail!(
                "fetch.min_delay_ms ({}) is greater than fetch.max_delay_ms ({})",
                self.fetch.min_delay_ms,
                self.fetch.max_delay_ms
            );
        }
        if self.extract.body_selectors.iter().all(|s| s.trim().is_empty()) {
            anyhow::bail!("extract.body_selectors must contain at least one selector");
        }
        if self.output.dir.trim().is_empty() {
            anyhow::bail!("output.dir must not be empty");
        }
        if self.summary.backend == SummaryBackend::Llm {
            url::Url::parse(&self.llm.api_url)
                .with_context(|| format!("llm.api_url is not a valid URL: {}", self.llm.api_url))?;
            if self.llm.model.trim().is_empty() {
                anyhow::bail!("llm.model must not be empty");
            }
        }
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = Config::from_toml_str("").expect("parse config");
        assert_eq!(cfg.output.dir, "content/posts");
        assert_eq!(cfg.summary.sentences, 3);
        assert_eq!(cfg.summary.language, "en");
        assert_eq!(cfg.summary.backend, SummaryBackend::Extractive);
        assert_eq!(cfg.fetch.timeout_seconds, 10);
        assert_eq!(cfg.source.max_articles, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml = r#"
            [source]
            listing_url = "https://example.com/blog"

            [summary]
            backend = "llm"
            sentences = 5

            [output]
            naming = "title"
            tags = ["pharma", "news"]
        "#;

        let cfg = Config::from_toml_str(toml).expect("parse config");
        assert_eq!(cfg.source.listing_url.as_deref(), Some("https://example.com/blog"));
        assert_eq!(cfg.source.link_selector, "div.post-list-item a.post-link");
        assert_eq!(cfg.summary.backend, SummaryBackend::Llm);
        assert_eq!(cfg.summary.sentences, 5);
        assert_eq!(cfg.summary.placeholder, "Summary unavailable.");
        assert_eq!(cfg.output.naming, FileNaming::Title);
        assert_eq!(cfg.output.tags, vec!["pharma", "news"]);
        assert_eq!(cfg.llm.adapter, LlmAdapter::Ollama);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = Config::from_toml_str("[summary]\nbackend = \"magic\"\n");
        assert!(err.is_err());
        assert!("magic".parse::<SummaryBackend>().is_err());
        assert_eq!("LLM".parse::<SummaryBackend>().unwrap(), SummaryBackend::Llm);
    }

    #[test]
    fn validate_catches_bad_values() {
        let mut cfg = Config::default();
        cfg.source.listing_url = Some("not a url".to_string());
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.fetch.min_delay_ms = 5000;
        cfg.fetch.max_delay_ms = 10;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.extract.body_selectors = vec![" ".to_string()];
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.fetch.timeout_seconds = 0;
        assert!(cfg.validate().is_err());
    }

    #[tokio::test]
    async fn override_file_takes_precedence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");

        std::fs::write(
            &default_path,
            "[summary]\nsentences = 4\nlanguage = \"fr\"\n\n[output]\ndir = \"posts\"\n",
        )
        .expect("write default");
        std::fs::write(&override_path, "[summary]\nsentences = 2\n").expect("write override");

        let cfg = Config::load_with_defaults(Some(default_path.as_path()), Some(override_path.as_path()))
            .await
            .expect("load config");
        assert_eq!(cfg.summary.sentences, 2);
        assert_eq!(cfg.summary.language, "fr");
        assert_eq!(cfg.output.dir, "posts");
    }

    #[tokio::test]
    async fn missing_files_fall_back_to_builtin_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let cfg = Config::load_with_defaults(Some(missing.as_path()), None).await.expect("load config");
        assert_eq!(cfg.output.dir, "content/posts");

        assert!(Config::from_file(&missing).await.is_err());
    }
}
