//! Deterministic hash-based embedding provider.
//!
//! Derives a fixed-length vector from the SHA-256 digest of the text.
//! Not semantically meaningful, but deterministic and cheap: identical
//! text always maps to the identical vector, which is what the indexer
//! produced, so exact and near-exact passages still retrieve correctly.
//! Used as the default when no embedding model is deployed.

use crate::embeddings::{normalize, Embedder};
use sahayak_core::AppResult;
use sha2::{Digest, Sha256};

/// Hash-based embedding provider.
#[derive(Debug)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create a new hash embedder with the given dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Derive an embedding from the text's SHA-256 digest.
    ///
    /// Each dimension cycles through the digest bytes, offset by the
    /// dimension index so vectors are not periodic in digest length.
    fn generate(&self, text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());

        let mut embedding = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let byte = digest[i % digest.len()];
            let mixed = byte.wrapping_add((i / digest.len()) as u8);
            // Center on zero so cosine distances spread out
            embedding.push((mixed as f32 / 255.0) - 0.5);
        }

        normalize(&mut embedding);
        embedding
    }
}

#[async_trait::async_trait]
impl Embedder for HashEmbedder {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(self.generate(text))
    }
}
