//! Sahayak Core Library
//!
//! This crate provides the foundational utilities for the Sahayak assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (retrieval, policy, session, LLM settings)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
