use anyhow::{Context, Result};
use common::{LlmAdapter, LlmConfig};
use std::sync::Arc;

/// Core trait for text-generation backends
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Summarize article text. Reasoning blocks are already stripped from `content`.
    async fn summarize(&self, content: &str) -> Result<LlmResponse>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub mod ollama;
pub mod remote;
pub mod summarizer;

/// Create the provider selected by `llm.adapter`.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.adapter {
        LlmAdapter::Ollama => {
            let provider = ollama::OllamaProvider::new(&config.api_url, &config.model)
                .with_defaults(config.timeout_seconds, config.max_tokens, config.temperature)
                .with_prompt_template(&config.prompt);
            Ok(Arc::new(provider))
        }
        LlmAdapter::Openai => {
            // Fetch API key from env var
            let api_key_env = config
                .api_key_env
                .as_deref()
                .context("llm.api_key_env is required for the openai adapter")?;
            let api_key = std::env::var(api_key_env)
                .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))?;

            let provider = remote::RemoteLlmProvider::new(&config.api_url, api_key, &config.model)
                .with_defaults(config.timeout_seconds, config.max_tokens, config.temperature)
                .with_prompt_template(&config.prompt);
            Ok(Arc::new(provider))
        }
    }
}

/// Placeholder in prompt templates that receives the article text
pub const ARTICLE_PLACEHOLDER: &str = "{article}";

/// Fill a prompt template. Without a placeholder the article is appended after a blank line.
pub fn render_prompt(template: &str, article: &str) -> String {
    if template.contains(ARTICLE_PLACEHOLDER) {
        template.replace(ARTICLE_PLACEHOLDER, article)
    } else {
        format!("{}\n\n{}", template.trim_end(), article)
    }
}

/// Remove `<think>...</think>` blocks emitted by reasoning models and trim the rest.
/// An unterminated block swallows everything after it.
pub fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// First `max_chars` characters of `text` (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
