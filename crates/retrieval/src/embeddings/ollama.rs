//! Ollama embedding provider.
//!
//! Generates embeddings via a local Ollama instance
//! (e.g., the nomic-embed-text model).

use crate::embeddings::{normalize, Embedder};
use sahayak_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Ollama embeddings API request format.
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    prompt: String,
}

/// Ollama embeddings API response format.
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

/// Ollama embedding provider.
#[derive(Debug)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    dimensions: usize,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder against the default local endpoint.
    pub fn new(model: String, dimensions: usize) -> Self {
        Self::with_base_url("http://localhost:11434", model, dimensions)
    }

    /// Create a new Ollama embedder with a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: String,
        dimensions: usize,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model,
            dimensions,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Embedder for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = OllamaEmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to reach Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Ollama embeddings API error ({}): {}",
                status, error_text
            )));
        }

        let embed_response: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse embedding: {}", e)))?;

        let mut embedding = embed_response.embedding;
        if embedding.len() != self.dimensions {
            return Err(AppError::Retrieval(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        normalize(&mut embedding);
        Ok(embedding)
    }
}
