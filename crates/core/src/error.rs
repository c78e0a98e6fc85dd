//! Error types for the Sahayak assistant.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM, retrieval, session handling,
//! and request validation.

use thiserror::Error;

/// Unified error type for the Sahayak assistant.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// Two conditions from the pipeline's failure taxonomy are deliberately NOT
/// variants here: an unreachable index degrades to an empty retrieval, and a
/// failed generation degrades to a fixed connectivity message. Both still
/// produce a response.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector index and retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Session store errors
    #[error("Session error: {0}")]
    Session(String),

    /// Rejected before entering the pipeline (empty or oversized message)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
