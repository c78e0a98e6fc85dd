//! Query pipeline orchestration.
//!
//! One `handle` call per incoming request:
//! validate → preprocess → classify → embed → retrieve → score →
//! policy branch → synthesize (or refuse) → assemble response → log.
//!
//! Failures in optional enrichment (history, logging) never prevent a
//! best-effort answer; only malformed input is rejected outright, and every
//! degraded path reports its true retrieval confidence.

use crate::confidence;
use crate::intent;
use crate::policy::{self, Verdict};
use crate::qlog::{LogEntry, QueryLog};
use crate::session::SessionStore;
use crate::synthesize::Synthesizer;
use crate::types::{messages, ChatRequest, ChatResponse, DebugInfo, SourceRef, MAX_SOURCES};
use chrono::Utc;
use sahayak_core::config::AppConfig;
use sahayak_core::{AppError, AppResult};
use sahayak_retrieval::{Embedder, RetrievalOutcome, Retriever, Topic};
use std::sync::Arc;
use std::time::Instant;

/// The query-answering pipeline.
pub struct QueryPipeline {
    config: AppConfig,
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    synthesizer: Synthesizer,
    sessions: Arc<dyn SessionStore>,
    qlog: Arc<dyn QueryLog>,
}

impl QueryPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
        retriever: Retriever,
        synthesizer: Synthesizer,
        sessions: Arc<dyn SessionStore>,
        qlog: Arc<dyn QueryLog>,
    ) -> Self {
        Self {
            config,
            embedder,
            retriever,
            synthesizer,
            sessions,
            qlog,
        }
    }

    /// Handle one chat request end to end.
    ///
    /// Returns `MalformedRequest` for empty or oversized messages; every
    /// other condition produces a response.
    pub async fn handle(&self, request: ChatRequest) -> AppResult<ChatResponse> {
        let started = Instant::now();

        let message = self.validate(&request.message)?;
        let session_id = request
            .session_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        tracing::info!("Processing query for session '{}'", session_id);

        // Advisory cleanup of stale sessions
        self.sessions
            .evict_idle(chrono::Duration::minutes(self.config.session.idle_minutes as i64))
            .await;

        // Classification is lexical and infallible
        let processed = intent::preprocess(&message);
        let signal = intent::classify_with_scores(&processed);
        let kind = intent::detect_kind(&message);

        // Retrieval; an embedder failure degrades like an unreachable index
        let top_k = self.config.retrieval.top_k;
        let outcome = match self.embedder.embed(&processed).await {
            Ok(embedding) => self.retriever.retrieve(&embedding, signal.topic, top_k),
            Err(e) => {
                tracing::warn!("Embedding failed, treating index as unavailable: {}", e);
                RetrievalOutcome {
                    passages: Vec::new(),
                    index_unavailable: true,
                }
            }
        };

        let conf = confidence::score(&self.config.policy, &outcome.passages, top_k);
        let verdict = policy::decide(
            &self.config.policy,
            conf.score,
            outcome.passages.is_empty(),
            signal.topic,
        );

        tracing::debug!(
            "Topic {} ({}), {} passages, confidence {:.3}, verdict {}",
            signal.topic,
            kind.as_str(),
            outcome.passages.len(),
            conf.score,
            verdict
        );

        // Policy branch
        let (response_text, sources, log_outcome) = match verdict {
            Verdict::Refuse => {
                let text = if signal.topic == Topic::OffTopic {
                    messages::OFF_TOPIC
                } else {
                    messages::NO_RESULTS
                };
                (text.to_string(), Vec::new(), verdict.as_str().to_string())
            }
            Verdict::Answerable | Verdict::Hedge => {
                let history = self
                    .sessions
                    .recent_turns(&session_id, self.config.session.history_turns)
                    .await;

                let synthesis = self
                    .synthesizer
                    .synthesize(
                        &processed,
                        kind,
                        &outcome.passages,
                        &history,
                        verdict == Verdict::Hedge,
                    )
                    .await?;

                let log_outcome = if synthesis.generation_failed {
                    "generation_failed".to_string()
                } else {
                    verdict.as_str().to_string()
                };

                (synthesis.text, assemble_sources(&outcome), log_outcome)
            }
        };

        let processing_time = started.elapsed().as_secs_f64();

        // Record the turn; session failures must not affect the response
        self.sessions
            .append_turn(&session_id, message.clone(), response_text.clone())
            .await;

        // Fire-and-forget observability
        self.qlog.append(LogEntry {
            timestamp: Utc::now(),
            query: message,
            response: response_text.clone(),
            confidence: conf.score,
            retrieved_count: outcome.passages.len(),
            processing_time,
            topic: signal.topic,
            outcome: log_outcome,
        });

        let debug = request.include_debug.then(|| DebugInfo {
            processed_query: processed,
            query_kind: kind,
            intent_scores: signal.scores,
            retrieved_count: outcome.passages.len(),
            index_unavailable: outcome.index_unavailable,
            verdict,
        });

        Ok(ChatResponse {
            response: response_text,
            confidence: conf.score,
            sources,
            topic_detected: signal.topic,
            processing_time,
            session_id,
            debug,
        })
    }

    /// Validate the raw message before it enters the pipeline.
    fn validate(&self, message: &str) -> AppResult<String> {
        let trimmed = message.trim();

        if trimmed.is_empty() {
            return Err(AppError::MalformedRequest(
                "Message must not be empty".to_string(),
            ));
        }

        let max = self.config.query.max_query_length;
        if trimmed.chars().count() > max {
            return Err(AppError::MalformedRequest(format!(
                "Message too long; the limit is {} characters",
                max
            )));
        }

        Ok(trimmed.to_string())
    }
}

/// Build the source references for a response.
///
/// Always a subset of the retrieval for this query, ascending by distance,
/// truncated to `MAX_SOURCES`, similarity scaled to [0, 100].
fn assemble_sources(outcome: &RetrievalOutcome) -> Vec<SourceRef> {
    outcome
        .passages
        .iter()
        .take(MAX_SOURCES)
        .map(|retrieved| SourceRef {
            title: retrieved.passage.title.clone(),
            url: retrieved.passage.url.clone(),
            topic: retrieved.passage.topic,
            similarity: (retrieved.similarity() * 100.0).clamp(0.0, 100.0),
        })
        .collect()
}
