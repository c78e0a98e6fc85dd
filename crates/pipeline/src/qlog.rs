//! Append-only query log.
//!
//! Each interaction is recorded as one JSON line for observability. The
//! write path is fire-and-forget: entries go through an unbounded channel
//! to a background writer task, so logging never blocks (or fails) the
//! response path. Ordering across entries is unspecified; each entry is
//! written atomically as a single line.

use chrono::{DateTime, Utc};
use sahayak_core::AppResult;
use sahayak_retrieval::Topic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// One logged interaction. Never mutated or deleted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response: String,
    pub confidence: f32,
    pub retrieved_count: usize,
    pub processing_time: f64,
    pub topic: Topic,
    /// Policy verdict label, or "generation_failed" for degraded synthesis
    pub outcome: String,
}

/// Maximum characters of response text preserved per entry.
const MAX_LOGGED_RESPONSE_CHARS: usize = 200;

impl LogEntry {
    /// Truncate the response text to keep log lines bounded.
    pub fn with_bounded_response(mut self) -> Self {
        if self.response.chars().count() > MAX_LOGGED_RESPONSE_CHARS {
            let truncated: String = self.response.chars().take(MAX_LOGGED_RESPONSE_CHARS).collect();
            self.response = format!("{}...", truncated);
        }
        self
    }
}

/// Query log abstraction. `append` must not block the caller.
pub trait QueryLog: Send + Sync {
    fn append(&self, entry: LogEntry);
}

/// JSONL-backed query log.
pub struct JsonlQueryLog {
    tx: mpsc::UnboundedSender<LogEntry>,
}

impl JsonlQueryLog {
    /// Create the log and spawn its writer task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(path: PathBuf) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<LogEntry>();

        tokio::spawn(async move {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await;

            let mut file = match file {
                Ok(file) => file,
                Err(e) => {
                    tracing::error!("Query log disabled, cannot open {:?}: {}", path, e);
                    // Drain silently so senders never notice
                    while rx.recv().await.is_some() {}
                    return;
                }
            };

            while let Some(entry) = rx.recv().await {
                let line = match serde_json::to_string(&entry) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Failed to serialize log entry: {}", e);
                        continue;
                    }
                };

                if let Err(e) = file.write_all(format!("{}\n", line).as_bytes()).await {
                    tracing::warn!("Failed to write log entry: {}", e);
                }
            }
        });

        Ok(Self { tx })
    }
}

impl QueryLog for JsonlQueryLog {
    fn append(&self, entry: LogEntry) {
        let entry = entry.with_bounded_response();
        if self.tx.send(entry).is_err() {
            // Writer task gone; losing a log entry never affects the answer
            tracing::warn!("Query log writer unavailable, entry dropped");
        }
    }
}

/// No-op log for tests and logless deployments.
#[derive(Debug, Default)]
pub struct NullQueryLog;

impl QueryLog for NullQueryLog {
    fn append(&self, _entry: LogEntry) {}
}

/// Aggregated view over the query log.
#[derive(Debug, Clone, Serialize)]
pub struct QueryStats {
    pub total_queries: usize,
    pub average_confidence: f32,
    pub average_processing_time: f64,
    pub topic_distribution: BTreeMap<String, usize>,
    pub last_query_at: Option<DateTime<Utc>>,
}

/// Read and aggregate the query log.
///
/// A missing file is zero queries, not an error; unparseable lines are
/// skipped (the log is append-only and a crashed writer can leave a torn
/// final line).
pub fn read_stats(path: &Path) -> AppResult<QueryStats> {
    let mut stats = QueryStats {
        total_queries: 0,
        average_confidence: 0.0,
        average_processing_time: 0.0,
        topic_distribution: BTreeMap::new(),
        last_query_at: None,
    };

    if !path.exists() {
        return Ok(stats);
    }

    let contents = std::fs::read_to_string(path)?;

    let mut confidence_sum = 0.0_f32;
    let mut time_sum = 0.0_f64;

    for line in contents.lines() {
        let entry: LogEntry = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        stats.total_queries += 1;
        confidence_sum += entry.confidence;
        time_sum += entry.processing_time;
        *stats
            .topic_distribution
            .entry(entry.topic.as_str().to_string())
            .or_insert(0) += 1;

        if stats.last_query_at.map_or(true, |t| entry.timestamp > t) {
            stats.last_query_at = Some(entry.timestamp);
        }
    }

    if stats.total_queries > 0 {
        stats.average_confidence = confidence_sum / stats.total_queries as f32;
        stats.average_processing_time = time_sum / stats.total_queries as f64;
    }

    Ok(stats)
}
