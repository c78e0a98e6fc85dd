//! Grounded answer synthesis.
//!
//! Sends the grounding prompt to the completion service with a bounded
//! timeout and a single retry with backoff, then fails closed: a generation
//! failure produces a fixed connectivity message followed by the retrieved
//! evidence quoted directly. Retrieval confidence is unaffected — the
//! evidence is still meaningful even when generation is not.

use crate::intent::QueryKind;
use crate::prompt::{system_instruction, PromptBuilder};
use crate::session::Turn;
use crate::types::messages;
use sahayak_core::config::LlmSettings;
use sahayak_core::{AppError, AppResult};
use sahayak_llm::{LlmClient, LlmRequest};
use sahayak_retrieval::RetrievedPassage;
use std::sync::Arc;
use std::time::Duration;

/// Characters of passage text quoted per passage in the extractive fallback.
const MAX_EXTRACT_CHARS: usize = 300;

/// Passages quoted in the extractive fallback.
const MAX_EXTRACT_PASSAGES: usize = 2;

/// Result of a synthesis attempt.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    /// Final response text (generated, or the connectivity fallback)
    pub text: String,

    /// True when the completion service failed after retries
    pub generation_failed: bool,
}

/// Answer synthesizer.
pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
    settings: LlmSettings,
    prompts: PromptBuilder,
}

impl Synthesizer {
    /// Create a synthesizer for the given client and model.
    pub fn new(client: Arc<dyn LlmClient>, model: String, settings: LlmSettings) -> AppResult<Self> {
        Ok(Self {
            client,
            model,
            settings,
            prompts: PromptBuilder::new()?,
        })
    }

    /// Synthesize an answer grounded in the retrieved passages.
    ///
    /// Never blocks indefinitely: each attempt runs under the configured
    /// timeout, and after the single retry the method returns the
    /// connectivity fallback rather than an error.
    pub async fn synthesize(
        &self,
        query: &str,
        kind: QueryKind,
        passages: &[RetrievedPassage],
        history: &[Turn],
        hedged: bool,
    ) -> AppResult<SynthesisOutcome> {
        let prompt = self.prompts.build(query, kind, passages, history)?;

        let request = LlmRequest::new(prompt, &self.model)
            .with_system(system_instruction(hedged))
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature);

        match self.complete_with_retry(&request).await {
            Ok(content) => Ok(SynthesisOutcome {
                text: post_process(content, passages),
                generation_failed: false,
            }),
            Err(e) => {
                tracing::error!("Generation failed after retry: {}", e);
                Ok(SynthesisOutcome {
                    text: extractive_fallback(passages),
                    generation_failed: true,
                })
            }
        }
    }

    /// One attempt plus a single retry with backoff.
    async fn complete_with_retry(&self, request: &LlmRequest) -> AppResult<String> {
        match self.attempt(request).await {
            Ok(content) => Ok(content),
            Err(first_error) => {
                tracing::warn!(
                    "Completion attempt failed, retrying after {}ms: {}",
                    self.settings.retry_backoff_ms,
                    first_error
                );
                tokio::time::sleep(Duration::from_millis(self.settings.retry_backoff_ms)).await;
                self.attempt(request).await
            }
        }
    }

    /// Single completion attempt under the configured deadline.
    async fn attempt(&self, request: &LlmRequest) -> AppResult<String> {
        let deadline = Duration::from_secs(self.settings.timeout_secs);

        match tokio::time::timeout(deadline, self.client.complete(request)).await {
            Ok(Ok(response)) => Ok(response.content),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AppError::Llm(format!(
                "Completion timed out after {}s",
                self.settings.timeout_secs
            ))),
        }
    }
}

/// Fixed connectivity message followed by the evidence quoted directly.
fn extractive_fallback(passages: &[RetrievedPassage]) -> String {
    let mut parts = vec![messages::GENERATION_FAILED.to_string()];

    for retrieved in passages.iter().take(MAX_EXTRACT_PASSAGES) {
        let text = &retrieved.passage.text;
        let quoted = if text.chars().count() > MAX_EXTRACT_CHARS {
            let truncated: String = text.chars().take(MAX_EXTRACT_CHARS).collect();
            format!("{}...", truncated)
        } else {
            text.clone()
        };

        parts.push(format!("According to {}: {}", retrieved.passage.title, quoted));
    }

    parts.join("\n\n")
}

/// Clean up generated text and attribute the best passage.
fn post_process(text: String, passages: &[RetrievedPassage]) -> String {
    let mut text = text.trim().to_string();

    // Collapse runs of 3+ newlines
    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }

    // Attribute the best passage when the model produced no source line
    if !text.contains("Source:") {
        if let Some(url) = passages.first().and_then(|r| r.passage.url.as_deref()) {
            text.push_str(&format!("\n\nSource: {}", url));
        }
    }

    text
}
