//! Retrieval confidence scoring.
//!
//! Combines the similarity distribution and the retrieval count into a
//! single score in [0, 1]. The weighting constants are policy parameters
//! (`PolicyConfig`), not hardcoded values.

use sahayak_core::config::PolicyConfig;
use sahayak_retrieval::RetrievedPassage;

/// Confidence score with the distances that produced it.
#[derive(Debug, Clone)]
pub struct ConfidenceResult {
    /// Score in [0, 1]; exactly 0 for empty retrieval
    pub score: f32,

    /// Distances of the scored passages, ascending
    pub basis: Vec<f32>,
}

impl ConfidenceResult {
    fn empty() -> Self {
        Self {
            score: 0.0,
            basis: Vec::new(),
        }
    }
}

/// Score a retrieval result.
///
/// With similarities `s1 >= s2 >= ...` (passages arrive ascending by
/// distance):
/// - base: `top1_weight * s1 + (1 - top1_weight) * mean(s2..)`, where the
///   mean of the rest falls back to `s1` for a single result
/// - shortfall: multiplied by `1 - shortfall_penalty * missing/k` when fewer
///   than `requested_k` passages came back
/// - acceptance: multiplied by `accept_penalty` when `s1` is below
///   `accept_threshold`
///
/// The result is clamped to [0, 1]. Strictly increasing in the best
/// similarity and strictly decreasing in the number of missing results.
pub fn score(
    policy: &PolicyConfig,
    retrieved: &[RetrievedPassage],
    requested_k: usize,
) -> ConfidenceResult {
    if retrieved.is_empty() {
        return ConfidenceResult::empty();
    }

    let similarities: Vec<f32> = retrieved.iter().map(|r| r.similarity()).collect();
    let top1 = similarities[0];

    let mean_rest = if similarities.len() > 1 {
        similarities[1..].iter().sum::<f32>() / (similarities.len() - 1) as f32
    } else {
        top1
    };

    let base = policy.top1_weight * top1 + (1.0 - policy.top1_weight) * mean_rest;

    let requested_k = requested_k.max(1);
    let missing = requested_k.saturating_sub(retrieved.len()) as f32;
    let shortfall = 1.0 - policy.shortfall_penalty * (missing / requested_k as f32);

    let mut confidence = base * shortfall;

    if top1 < policy.accept_threshold {
        confidence *= policy.accept_penalty;
    }

    ConfidenceResult {
        score: confidence.clamp(0.0, 1.0),
        basis: retrieved.iter().map(|r| r.distance).collect(),
    }
}
