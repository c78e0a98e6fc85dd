//! SQLite-backed vector index.
//!
//! Reads the passage database produced by the external indexer. The schema
//! is a single `passages` table with embeddings stored as little-endian
//! f32 BLOBs.

use crate::index::{cosine_distance, VectorIndex};
use crate::types::{Passage, Topic};
use sahayak_core::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

/// SQLite vector index backend.
///
/// The connection is wrapped in a mutex because rusqlite connections are not
/// `Sync`; searches are short local reads, so contention is negligible.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open an existing passage database.
    ///
    /// Fails if the file does not exist — an absent index is a deployment
    /// problem, distinct from a present-but-empty one.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if !db_path.exists() {
            return Err(AppError::Retrieval(format!(
                "Passage index not found at {:?}. Run the indexer first.",
                db_path
            )));
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Retrieval(format!("Failed to open passage index: {}", e)))?;

        tracing::debug!("Opened passage index at {:?}", db_path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new passage database with the expected schema.
    ///
    /// Exists for fixtures and tooling; the production index is written by
    /// the external ingestion pipeline against the same schema.
    pub fn create(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Retrieval(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Retrieval(format!("Failed to open passage index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS passages (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT,
                topic TEXT NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Retrieval(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a passage. Fixture/tooling path only.
    pub fn insert(&self, passage: &Passage) -> AppResult<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO passages (id, title, url, topic, text, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                passage.id,
                passage.title,
                passage.url,
                passage.topic.as_str(),
                passage.text,
                embedding_to_bytes(&passage.embedding),
            ],
        )
        .map_err(|e| AppError::Retrieval(format!("Failed to insert passage: {}", e)))?;

        Ok(())
    }

    fn lock_conn(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Retrieval("Passage index lock poisoned".to_string()))
    }
}

impl VectorIndex for SqliteIndex {
    fn search(&self, query_embedding: &[f32], k: usize) -> AppResult<Vec<(Passage, f32)>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn
            .prepare("SELECT id, title, url, topic, text, embedding FROM passages")
            .map_err(|e| AppError::Retrieval(format!("Failed to prepare query: {}", e)))?;

        let passages_iter = stmt
            .query_map([], |row| {
                let topic_str: String = row.get(3)?;
                let embedding_bytes: Vec<u8> = row.get(5)?;
                let embedding = bytes_to_embedding(&embedding_bytes)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

                Ok(Passage {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    url: row.get(2)?,
                    topic: Topic::parse(&topic_str),
                    text: row.get(4)?,
                    embedding,
                })
            })
            .map_err(|e| AppError::Retrieval(format!("Failed to query passages: {}", e)))?;

        let mut results: Vec<(Passage, f32)> = passages_iter
            .filter_map(|r| r.ok())
            .map(|passage| {
                let distance = cosine_distance(query_embedding, &passage.embedding);
                (passage, distance)
            })
            .collect();

        // Sort by distance ascending
        results.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        tracing::debug!("Index returned {} passages (requested top-{})", results.len(), k);

        Ok(results)
    }

    fn len(&self) -> AppResult<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))
            .map_err(|e| AppError::Retrieval(format!("Failed to count passages: {}", e)))?;

        Ok(count as usize)
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Retrieval(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        embedding.push(value);
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, topic: Topic, embedding: Vec<f32>) -> Passage {
        Passage {
            id: id.to_string(),
            title: format!("Passage {}", id),
            url: Some(format!("https://example.gov.in/{}", id)),
            topic,
            text: format!("text of {}", id),
            embedding,
        }
    }

    #[test]
    fn test_open_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteIndex::open(&dir.path().join("missing.db"));
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let index = SqliteIndex::create(&dir.path().join("passages.db")).unwrap();

        index
            .insert(&passage("p1", Topic::Funding, vec![1.0, 0.0, 0.0]))
            .unwrap();
        index
            .insert(&passage("p2", Topic::Tax, vec![0.0, 1.0, 0.0]))
            .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "p1");
        assert!(results[0].1 < results[1].1);
        assert_eq!(results[0].0.topic, Topic::Funding);
    }

    #[test]
    fn test_reopen_preserves_passages() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("passages.db");

        {
            let index = SqliteIndex::create(&db_path).unwrap();
            index
                .insert(&passage("p1", Topic::General, vec![1.0, 0.0]))
                .unwrap();
        }

        let reopened = SqliteIndex::open(&db_path).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let original = vec![0.25, -1.5, 0.0, 3.75];
        let bytes = embedding_to_bytes(&original);
        let restored = bytes_to_embedding(&bytes).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_invalid_embedding_bytes() {
        assert!(bytes_to_embedding(&[1, 2, 3]).is_err());
    }
}
