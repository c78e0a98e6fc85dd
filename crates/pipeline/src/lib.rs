//! Sahayak Pipeline Library
//!
//! The query-answering pipeline: intent classification, vector retrieval,
//! confidence scoring, fallback policy, grounded answer synthesis, source
//! attribution, session history and query logging.
//!
//! Control flow per query:
//! classify → embed → retrieve → score → policy branch → synthesize (or
//! refuse) → assemble response → log.

pub mod confidence;
pub mod intent;
pub mod pipeline;
pub mod policy;
pub mod prompt;
pub mod qlog;
pub mod session;
pub mod synthesize;
pub mod types;

// Re-export commonly used types
pub use pipeline::QueryPipeline;
pub use policy::Verdict;
pub use qlog::{JsonlQueryLog, LogEntry, QueryLog};
pub use session::{InMemorySessionStore, SessionStore};
pub use types::{ChatRequest, ChatResponse, SourceRef};
