//! Session state: per-conversation short-term memory.
//!
//! Recent turns disambiguate follow-up queries ("what about for women?"
//! after a funding question). The store is an abstraction with pluggable
//! backing; the in-memory implementation here serves single-process
//! deployments and tests.
//!
//! Concurrency: appends to the same session id serialize on a per-session
//! mutex; different session ids are fully independent. No lock is ever held
//! across a network call — callers read a snapshot of the turns, release,
//! and append after synthesis completes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Hard cap on stored turns per session; older turns roll off.
const MAX_HISTORY_TURNS: usize = 20;

/// One question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub answer: String,
}

/// Per-conversation state.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub history: Vec<Turn>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            history: Vec::new(),
            last_active: Utc::now(),
        }
    }

    /// Reset a session whose state fails its consistency checks.
    ///
    /// An inconsistent session is repaired, never fatal: the query proceeds
    /// against a fresh history.
    fn ensure_consistent(&mut self) {
        let runaway_history = self.history.len() > MAX_HISTORY_TURNS * 4;
        let clock_skewed = self.last_active > Utc::now() + Duration::minutes(5);

        if runaway_history || clock_skewed {
            tracing::warn!(
                "Resetting inconsistent session '{}' ({} turns, last_active {})",
                self.session_id,
                self.history.len(),
                self.last_active
            );
            self.history.clear();
            self.last_active = Utc::now();
        }
    }
}

/// Session store abstraction.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a snapshot of the session, creating it if absent.
    async fn get_or_create(&self, session_id: &str) -> Session;

    /// The most recent `n` turns, oldest first.
    async fn recent_turns(&self, session_id: &str, n: usize) -> Vec<Turn>;

    /// Append a completed turn. Appends for the same session id are
    /// serialized; ordering across sessions is unspecified.
    async fn append_turn(&self, session_id: &str, query: String, answer: String);

    /// Drop sessions idle for longer than `idle`. Advisory cleanup; returns
    /// the number of sessions evicted.
    async fn evict_idle(&self, idle: Duration) -> usize;
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or create the shared handle for a session id.
    ///
    /// The map write lock is held only for the lookup/insert, never while
    /// the session itself is locked.
    async fn entry(&self, session_id: &str) -> Arc<Mutex<Session>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(session_id) {
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(session_id.to_string())))),
        )
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, session_id: &str) -> Session {
        let entry = self.entry(session_id).await;
        let mut session = entry.lock().await;
        session.ensure_consistent();
        session.clone()
    }

    async fn recent_turns(&self, session_id: &str, n: usize) -> Vec<Turn> {
        let entry = self.entry(session_id).await;
        let mut session = entry.lock().await;
        session.ensure_consistent();

        let start = session.history.len().saturating_sub(n);
        session.history[start..].to_vec()
    }

    async fn append_turn(&self, session_id: &str, query: String, answer: String) {
        let entry = self.entry(session_id).await;
        let mut session = entry.lock().await;
        session.ensure_consistent();

        session.history.push(Turn { query, answer });
        if session.history.len() > MAX_HISTORY_TURNS {
            let excess = session.history.len() - MAX_HISTORY_TURNS;
            session.history.drain(..excess);
        }
        session.last_active = Utc::now();
    }

    async fn evict_idle(&self, idle: Duration) -> usize {
        let cutoff = Utc::now() - idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        // A session whose mutex is held is in use; keep it regardless
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(session) => session.last_active >= cutoff,
            Err(_) => true,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} idle sessions", evicted);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_creates_session() {
        let store = InMemorySessionStore::new();
        let session = store.get_or_create("s-1").await;

        assert_eq!(session.session_id, "s-1");
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_append_and_recent_turns() {
        let store = InMemorySessionStore::new();

        store
            .append_turn("s-1", "q1".to_string(), "a1".to_string())
            .await;
        store
            .append_turn("s-1", "q2".to_string(), "a2".to_string())
            .await;
        store
            .append_turn("s-1", "q3".to_string(), "a3".to_string())
            .await;

        let turns = store.recent_turns("s-1", 2).await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].query, "q2");
        assert_eq!(turns[1].query, "q3");
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = InMemorySessionStore::new();

        store
            .append_turn("s-1", "q1".to_string(), "a1".to_string())
            .await;
        store
            .append_turn("s-2", "other".to_string(), "answer".to_string())
            .await;

        let turns = store.recent_turns("s-1", 10).await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].query, "q1");
    }

    #[tokio::test]
    async fn test_history_capped() {
        let store = InMemorySessionStore::new();

        for i in 0..MAX_HISTORY_TURNS + 5 {
            store
                .append_turn("s-1", format!("q{}", i), format!("a{}", i))
                .await;
        }

        let session = store.get_or_create("s-1").await;
        assert_eq!(session.history.len(), MAX_HISTORY_TURNS);
        // Oldest turns rolled off
        assert_eq!(session.history[0].query, "q5");
    }

    #[tokio::test]
    async fn test_concurrent_appends_preserve_all_turns() {
        let store = Arc::new(InMemorySessionStore::new());

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_turn("s-1", format!("q{}", i), format!("a{}", i))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = store.get_or_create("s-1").await;
        assert_eq!(session.history.len(), 10);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let store = InMemorySessionStore::new();
        store
            .append_turn("stale", "q".to_string(), "a".to_string())
            .await;

        // Nothing is older than an hour yet
        assert_eq!(store.evict_idle(Duration::hours(1)).await, 0);

        // Zero-width idle window evicts everything inactive
        assert_eq!(store.evict_idle(Duration::zero()).await, 1);
        let session = store.get_or_create("stale").await;
        assert!(session.history.is_empty());
    }
}
