//! Embedding provider trait and factory.
//!
//! The embedder is a deterministic function from text to a fixed-length
//! vector, shared by the external indexer and the query path so vectors
//! are comparable.

pub mod hash;
pub mod ollama;

use sahayak_core::config::EmbeddingConfig;
use sahayak_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "hash", "ollama")
    fn provider_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Create an embedding provider based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> AppResult<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "hash" => {
            let provider = hash::HashEmbedder::new(config.dimensions);
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let provider = ollama::OllamaEmbedder::new(config.model.clone(), config.dimensions);
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Retrieval(format!(
            "Unknown embedding provider: '{}'. Supported providers: hash, ollama",
            config.provider
        ))),
    }
}

/// Normalize a vector to unit length in place.
///
/// A zero vector is left untouched.
pub(crate) fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}
