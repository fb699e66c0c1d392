use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{render_prompt, strip_reasoning, LlmProvider, LlmRequest, LlmResponse, UsageMetadata};

/// Local model served by Ollama's `/api/generate` endpoint
pub struct OllamaProvider {
    api_url: String,
    model: String,
    prompt_template: String,
    default_timeout: Duration,
    default_max_tokens: usize,
    default_temperature: f32,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// `api_url` is the full generate endpoint, e.g. `http://localhost:11434/api/generate`.
    pub fn new(api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            model: model.into(),
            prompt_template: super::ARTICLE_PLACEHOLDER.to_string(),
            default_timeout: Duration::from_secs(120),
            default_max_tokens: 1024,
            default_temperature: 0.5,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_defaults(mut self, timeout_secs: u64, max_tokens: usize, temperature: f32) -> Self {
        self.default_timeout = Duration::from_secs(timeout_secs);
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let timeout = request
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let req_body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature.unwrap_or(self.default_temperature),
                num_predict: request.max_tokens.unwrap_or(self.default_max_tokens),
            },
        };

        let response = tokio::time::timeout(
            timeout,
            self.client.post(&self.api_url).json(&req_body).send(),
        )
        .await
        .context("Ollama request timed out")?
        .context("Ollama HTTP request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error {}: {}", status, body);
        }

        let resp_body: GenerateResponse = tokio::time::timeout(timeout, response.json::<GenerateResponse>())
            .await
            .context("Ollama request timed out")?
            .context("Failed to parse Ollama response")?;

        let prompt_tokens = resp_body.prompt_eval_count.unwrap_or(0);
        let completion_tokens = resp_body.eval_count.unwrap_or(0);

        Ok(LlmResponse {
            content: resp_body.response,
            usage: UsageMetadata {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            model: resp_body.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    async fn summarize(&self, content: &str) -> Result<LlmResponse> {
        let mut response = self
            .generate(LlmRequest {
                prompt: render_prompt(&self.prompt_template, content),
                max_tokens: None,
                temperature: None,
                timeout_seconds: None,
            })
            .await?;
        response.content = strip_reasoning(&response.content);
        Ok(response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    model: Option<String>,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}
