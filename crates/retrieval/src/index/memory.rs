//! In-memory vector index.
//!
//! Holds all passages in a vector and scans on search. Used for tests and
//! small single-process deployments.

use crate::index::{cosine_distance, VectorIndex};
use crate::types::Passage;
use sahayak_core::AppResult;

/// In-memory vector index backend.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    passages: Vec<Passage>,
}

impl InMemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index from pre-built passages.
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        Self { passages }
    }
}

impl VectorIndex for InMemoryIndex {
    fn search(&self, query_embedding: &[f32], k: usize) -> AppResult<Vec<(Passage, f32)>> {
        let mut results: Vec<(Passage, f32)> = self
            .passages
            .iter()
            .map(|p| (p.clone(), cosine_distance(query_embedding, &p.embedding)))
            .collect();

        results.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }

    fn len(&self) -> AppResult<usize> {
        Ok(self.passages.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Topic;

    fn passage(id: &str, embedding: Vec<f32>) -> Passage {
        Passage {
            id: id.to_string(),
            title: format!("Passage {}", id),
            url: None,
            topic: Topic::General,
            text: "text".to_string(),
            embedding,
        }
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = InMemoryIndex::from_passages(vec![
            passage("far", vec![0.0, 1.0]),
            passage("near", vec![1.0, 0.0]),
            passage("mid", vec![0.7, 0.7]),
        ]);

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.id, "near");
        assert_eq!(results[1].0.id, "mid");
        assert_eq!(results[2].0.id, "far");
        assert!(results[0].1 <= results[1].1 && results[1].1 <= results[2].1);
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = InMemoryIndex::from_passages(vec![
            passage("a", vec![1.0, 0.0]),
            passage("b", vec![0.9, 0.1]),
            passage("c", vec![0.0, 1.0]),
        ]);

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_index() {
        let index = InMemoryIndex::new();
        assert!(index.is_empty().unwrap());
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }
}
