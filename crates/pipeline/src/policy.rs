//! Fallback policy.
//!
//! Decides, from confidence and retrieval emptiness, whether to synthesize
//! normally, synthesize with hedged framing, or refuse. A pure function of
//! its inputs — no hidden state.

use sahayak_core::config::PolicyConfig;
use sahayak_retrieval::Topic;
use serde::Serialize;

/// Outcome of the fallback policy for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Confidence is high and retrieval is non-empty: synthesize normally.
    Answerable,

    /// Middling confidence: synthesize, but the prompt instructs the model
    /// to express uncertainty and recommend verifying officially.
    Hedge,

    /// Too little evidence or off-topic: skip the completion service and
    /// return a fixed message with empty sources.
    Refuse,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answerable => "answerable",
            Self::Hedge => "hedge",
            Self::Refuse => "refuse",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluate the policy for one query.
///
/// Evaluated once, after confidence scoring:
/// - empty retrieval, off-topic query, or confidence below `low_threshold`
///   refuses
/// - confidence at or above `high_threshold` answers normally
/// - anything in between hedges
pub fn decide(
    policy: &PolicyConfig,
    confidence: f32,
    retrieved_empty: bool,
    topic: Topic,
) -> Verdict {
    if retrieved_empty || topic == Topic::OffTopic || confidence < policy.low_threshold {
        return Verdict::Refuse;
    }

    if confidence >= policy.high_threshold {
        Verdict::Answerable
    } else {
        Verdict::Hedge
    }
}
