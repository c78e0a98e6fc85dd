//! Request/response data model and fixed response messages.

use crate::intent::QueryKind;
use crate::policy::Verdict;
use sahayak_retrieval::Topic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of source references attached to an answer.
pub const MAX_SOURCES: usize = 3;

/// An incoming chat request. Immutable once created.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,

    /// Session identifier; generated when absent
    #[serde(default)]
    pub session_id: Option<String>,

    /// Include debug information in the response
    #[serde(default)]
    pub include_debug: bool,
}

impl ChatRequest {
    /// Create a request with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            include_debug: false,
        }
    }

    /// Attach a session id.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Enable debug output.
    pub fn with_debug(mut self) -> Self {
        self.include_debug = true;
        self
    }
}

/// A source reference attached to an answer.
///
/// Always a subset of that query's retrieval, ordered by ascending distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source document title
    pub title: String,

    /// Source URL, if known
    pub url: Option<String>,

    /// Topic tag of the passage
    pub topic: Topic,

    /// Similarity percentage in [0, 100]
    pub similarity: f32,
}

/// The assembled answer returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Generated (or canned) response text
    pub response: String,

    /// Retrieval-derived confidence in [0, 1]
    pub confidence: f32,

    /// Up to `MAX_SOURCES` source references, ascending by distance
    pub sources: Vec<SourceRef>,

    /// Detected topic label
    pub topic_detected: Topic,

    /// Wall-clock processing time in seconds
    pub processing_time: f64,

    /// Session this turn belongs to
    pub session_id: String,

    /// Debug information, present only when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Debug payload for `include_debug` requests.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    /// Query after preprocessing
    pub processed_query: String,

    /// Detected query kind
    pub query_kind: QueryKind,

    /// Keyword hit counts per candidate topic
    pub intent_scores: BTreeMap<String, usize>,

    /// Number of passages retrieved
    pub retrieved_count: usize,

    /// Whether the index could not be searched
    pub index_unavailable: bool,

    /// Fallback policy decision
    pub verdict: Verdict,
}

/// Fixed responses for degraded paths. Transparency over fabrication: none
/// of these are presented as grounded answers.
pub mod messages {
    /// Refusal when retrieval found nothing usable.
    pub const NO_RESULTS: &str = "I couldn't find specific information about your query in my \
         knowledge base. Could you try rephrasing your question or ask about startup \
         registration, eligibility criteria, or funding schemes?";

    /// Refusal for queries outside the Startup India domain.
    pub const OFF_TOPIC: &str = "I can help with questions about Startup India policies, \
         registration procedures, eligibility criteria, funding schemes, and related topics. \
         Please ask a more specific question about those areas.";

    /// Shown when retrieval succeeded but generation failed after retries.
    /// Distinct from a refusal: the retrieved evidence is still presented.
    pub const GENERATION_FAILED: &str = "I'm having trouble reaching the answer service right \
         now. Here is the most relevant information I found:";
}
