// Summarizer module
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::{truncate_chars, LlmProvider};
use crate::nlp::ExtractiveSummarizer;

/// Which backend produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMethod {
    Extractive,
    Llm,
}

impl fmt::Display for SummaryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extractive => f.write_str("extractive"),
            Self::Llm => f.write_str("llm"),
        }
    }
}

/// Result of summarizing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated { text: String, method: SummaryMethod },
    /// Nothing usable came out; the caller decides what to persist
    Empty,
}

impl SummaryOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Generated { text, .. } => Some(text),
            Self::Empty => None,
        }
    }
}

/// Summarizes documents with an optional LLM, falling back to extractive ranking
pub struct Summarizer {
    extractive: ExtractiveSummarizer,
    llm: Option<Arc<dyn LlmProvider>>,
    max_input_chars: usize,
    fallback_to_extractive: bool,
}

impl Summarizer {
    pub fn extractive(extractive: ExtractiveSummarizer) -> Self {
        Self {
            extractive,
            llm: None,
            max_input_chars: usize::MAX,
            fallback_to_extractive: true,
        }
    }

    pub fn with_llm(
        extractive: ExtractiveSummarizer,
        provider: Arc<dyn LlmProvider>,
        max_input_chars: usize,
        fallback_to_extractive: bool,
    ) -> Self {
        Self {
            extractive,
            llm: Some(provider),
            max_input_chars,
            fallback_to_extractive,
        }
    }

    pub async fn summarize(&self, text: &str) -> SummaryOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SummaryOutcome::Empty;
        }

        if let Some(provider) = &self.llm {
            let input = truncate_chars(text, self.max_input_chars);
            match provider.summarize(input).await {
                Ok(response) if !response.content.is_empty() => {
                    info!(
                        model = %response.model,
                        chars = response.content.chars().count(),
                        prompt_tokens = response.usage.prompt_tokens,
                        completion_tokens = response.usage.completion_tokens,
                        total_tokens = response.usage.total_tokens,
                        "LLM summarization successful"
                    );
                    return SummaryOutcome::Generated {
                        text: response.content,
                        method: SummaryMethod::Llm,
                    };
                }
                Ok(_) => warn!(model = provider.model(), "LLM returned an empty summary"),
                Err(e) => warn!(model = provider.model(), error = %e, "LLM summarization failed"),
            }
            if !self.fallback_to_extractive {
                return SummaryOutcome::Empty;
            }
            info!("falling back to extractive summary");
        }

        let summary = self.extractive.summarize(text);
        if summary.is_empty() {
            SummaryOutcome::Empty
        } else {
            SummaryOutcome::Generated {
                text: summary,
                method: SummaryMethod::Extractive,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmRequest, LlmResponse, UsageMetadata};
    use crate::nlp::StopwordFilter;
    use std::sync::Mutex;

    const TEXT: &str = "Cats are great. Dogs are great too. Birds can fly. Fish swim well.";

    struct FakeProvider {
        reply: anyhow::Result<String>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn replying(reply: anyhow::Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for FakeProvider {
        async fn generate(&self, request: LlmRequest) -> anyhow::Result<LlmResponse> {
            Ok(LlmResponse {
                content: request.prompt,
                usage: UsageMetadata::default(),
                model: "fake".to_string(),
            })
        }

        async fn summarize(&self, content: &str) -> anyhow::Result<LlmResponse> {
            self.seen.lock().unwrap().push(content.to_string());
            match &self.reply {
                Ok(s) => Ok(LlmResponse {
                    content: s.clone(),
                    usage: UsageMetadata::default(),
                    model: "fake".to_string(),
                }),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    fn extractive() -> ExtractiveSummarizer {
        ExtractiveSummarizer::new(StopwordFilter::from_words(["are", "too", "can", "well"]), 2)
    }

    #[tokio::test]
    async fn extractive_backend() {
        let summarizer = Summarizer::extractive(extractive());
        assert_eq!(
            summarizer.summarize(TEXT).await,
            SummaryOutcome::Generated {
                text: "Cats are great. Dogs are great too.".to_string(),
                method: SummaryMethod::Extractive,
            }
        );
    }

    #[tokio::test]
    async fn blank_text_is_empty_without_calling_the_llm() {
        let provider = FakeProvider::replying(Ok("never".to_string()));
        let summarizer = Summarizer::with_llm(extractive(), provider.clone(), 2000, true);
        assert_eq!(summarizer.summarize("  \n ").await, SummaryOutcome::Empty);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn llm_summary_is_used_and_input_truncated() {
        let provider = FakeProvider::replying(Ok("A short take.".to_string()));
        let summarizer = Summarizer::with_llm(extractive(), provider.clone(), 15, true);
        let outcome = summarizer.summarize(TEXT).await;
        assert_eq!(outcome.text(), Some("A short take."));
        assert_eq!(provider.seen.lock().unwrap().as_slice(), ["Cats are great."]);
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_extractive() {
        let provider = FakeProvider::replying(Err(anyhow::anyhow!("connection refused")));
        let summarizer = Summarizer::with_llm(extractive(), provider, 2000, true);
        assert_eq!(
            summarizer.summarize(TEXT).await,
            SummaryOutcome::Generated {
                text: "Cats are great. Dogs are great too.".to_string(),
                method: SummaryMethod::Extractive,
            }
        );
    }

    #[tokio::test]
    async fn llm_failure_without_fallback_is_empty() {
        let provider = FakeProvider::replying(Ok(String::new()));
        let summarizer = Summarizer::with_llm(extractive(), provider, 2000, false);
        assert_eq!(summarizer.summarize(TEXT).await, SummaryOutcome::Empty);
    }
}
