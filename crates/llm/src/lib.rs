//! Sahayak LLM Library
//!
//! Provider-agnostic completion client used by the answer synthesizer:
//! - `LlmClient` trait with request/response types
//! - Ollama provider (local-first default)
//! - OpenAI-compatible provider (Groq and friends)
//! - Factory for creating clients from configuration

pub mod client;
pub mod factory;
pub mod providers;

// Re-export commonly used types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
