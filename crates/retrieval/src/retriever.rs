//! Topic-aware retrieval over the vector index.
//!
//! Wraps raw index search with deduplication and topic-hint re-ranking.
//! An unreachable or empty index degrades to an empty result set with a
//! flag — it never fails the query.

use crate::index::VectorIndex;
use crate::types::{RetrievedPassage, Topic};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of a retrieval pass.
#[derive(Debug, Default)]
pub struct RetrievalOutcome {
    /// Retrieved passages, ascending by distance, deduplicated by id,
    /// at most k entries.
    pub passages: Vec<RetrievedPassage>,

    /// Set when the index could not be searched. Soft condition: the
    /// caller sees an empty result set, not an error.
    pub index_unavailable: bool,
}

impl RetrievalOutcome {
    fn unavailable() -> Self {
        Self {
            passages: Vec::new(),
            index_unavailable: true,
        }
    }
}

/// Retriever over a vector index.
pub struct Retriever {
    index: Arc<dyn VectorIndex>,

    /// Distance reduction applied to passages matching the topic hint.
    topic_boost: f32,
}

impl Retriever {
    /// Create a retriever over the given index.
    pub fn new(index: Arc<dyn VectorIndex>, topic_boost: f32) -> Self {
        Self { index, topic_boost }
    }

    /// Retrieve the top-k passages for a query embedding.
    ///
    /// The topic hint is evidence, not a filter: passages tagged with the
    /// hinted topic get their distance reduced by `topic_boost` (floored at
    /// zero) before the final ranking, so a misclassified query can still
    /// surface relevant passages from other topics. When a specific hint is
    /// present the index is over-fetched (2k) so a same-topic passage just
    /// outside the raw top-k can enter the final ranking.
    pub fn retrieve(
        &self,
        query_embedding: &[f32],
        topic_hint: Topic,
        k: usize,
    ) -> RetrievalOutcome {
        let boost_active = topic_hint.is_specific() && self.topic_boost > 0.0;
        let fetch_k = if boost_active { k * 2 } else { k };

        let raw = match self.index.search(query_embedding, fetch_k) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Passage index unavailable: {}", e);
                return RetrievalOutcome::unavailable();
            }
        };

        // Deduplicate by passage id, keeping the closest occurrence
        // (raw results are already ascending).
        let mut seen: HashSet<String> = HashSet::new();
        let mut passages: Vec<RetrievedPassage> = Vec::with_capacity(raw.len());
        for (passage, distance) in raw {
            if !seen.insert(passage.id.clone()) {
                continue;
            }

            let distance = if boost_active && passage.topic == topic_hint {
                (distance - self.topic_boost).max(0.0)
            } else {
                distance
            };

            passages.push(RetrievedPassage { passage, distance });
        }

        // Boosting can reorder, re-sort on the effective distance
        passages.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        passages.truncate(k);

        tracing::debug!(
            "Retrieved {} passages (topic hint: {}, boost: {})",
            passages.len(),
            topic_hint,
            boost_active
        );

        RetrievalOutcome {
            passages,
            index_unavailable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;
    use crate::types::Passage;
    use sahayak_core::{AppError, AppResult};

    fn passage(id: &str, topic: Topic, embedding: Vec<f32>) -> Passage {
        Passage {
            id: id.to_string(),
            title: format!("Passage {}", id),
            url: None,
            topic,
            text: "text".to_string(),
            embedding,
        }
    }

    /// Index stub that always fails, standing in for an unreachable backend.
    struct BrokenIndex;

    impl VectorIndex for BrokenIndex {
        fn search(&self, _query: &[f32], _k: usize) -> AppResult<Vec<(Passage, f32)>> {
            Err(AppError::Retrieval("connection refused".to_string()))
        }

        fn len(&self) -> AppResult<usize> {
            Err(AppError::Retrieval("connection refused".to_string()))
        }
    }

    #[test]
    fn test_retrieve_orders_ascending() {
        let index = Arc::new(InMemoryIndex::from_passages(vec![
            passage("far", Topic::General, vec![0.0, 1.0]),
            passage("near", Topic::General, vec![1.0, 0.0]),
        ]));
        let retriever = Retriever::new(index, 0.0);

        let outcome = retriever.retrieve(&[1.0, 0.0], Topic::General, 5);
        assert!(!outcome.index_unavailable);
        assert_eq!(outcome.passages.len(), 2);
        assert_eq!(outcome.passages[0].passage.id, "near");
        assert!(outcome.passages[0].distance <= outcome.passages[1].distance);
    }

    #[test]
    fn test_topic_boost_reranks_but_never_excludes() {
        // "other" is slightly closer, but "funding" matches the hint
        let index = Arc::new(InMemoryIndex::from_passages(vec![
            passage("other", Topic::General, vec![0.95, 0.312]),
            passage("funding", Topic::Funding, vec![0.9, 0.436]),
        ]));
        let retriever = Retriever::new(index, 0.2);

        let outcome = retriever.retrieve(&[1.0, 0.0], Topic::Funding, 5);
        assert_eq!(outcome.passages.len(), 2);
        assert_eq!(outcome.passages[0].passage.id, "funding");
        // The off-topic passage is re-ranked, not dropped
        assert_eq!(outcome.passages[1].passage.id, "other");
    }

    #[test]
    fn test_no_boost_for_general_hint() {
        let index = Arc::new(InMemoryIndex::from_passages(vec![
            passage("a", Topic::General, vec![1.0, 0.0]),
            passage("b", Topic::Funding, vec![0.99, 0.141]),
        ]));
        let retriever = Retriever::new(index, 0.5);

        let outcome = retriever.retrieve(&[1.0, 0.0], Topic::General, 5);
        assert_eq!(outcome.passages[0].passage.id, "a");
    }

    #[test]
    fn test_boosted_distance_floored_at_zero() {
        let index = Arc::new(InMemoryIndex::from_passages(vec![passage(
            "f",
            Topic::Funding,
            vec![1.0, 0.0],
        )]));
        let retriever = Retriever::new(index, 0.5);

        let outcome = retriever.retrieve(&[1.0, 0.0], Topic::Funding, 5);
        assert!(outcome.passages[0].distance >= 0.0);
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let retriever = Retriever::new(Arc::new(InMemoryIndex::new()), 0.0);
        let outcome = retriever.retrieve(&[1.0, 0.0], Topic::General, 5);
        assert!(outcome.passages.is_empty());
        assert!(!outcome.index_unavailable);
    }

    #[test]
    fn test_unreachable_index_degrades_softly() {
        let retriever = Retriever::new(Arc::new(BrokenIndex), 0.0);
        let outcome = retriever.retrieve(&[1.0, 0.0], Topic::General, 5);
        assert!(outcome.passages.is_empty());
        assert!(outcome.index_unavailable);
    }

    #[test]
    fn test_truncates_to_k() {
        let index = Arc::new(InMemoryIndex::from_passages(vec![
            passage("a", Topic::General, vec![1.0, 0.0]),
            passage("b", Topic::General, vec![0.9, 0.436]),
            passage("c", Topic::General, vec![0.8, 0.6]),
        ]));
        let retriever = Retriever::new(index, 0.0);

        let outcome = retriever.retrieve(&[1.0, 0.0], Topic::General, 2);
        assert_eq!(outcome.passages.len(), 2);
    }
}
