use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// One user/assistant exchange persisted across compactions.
#[derive(Clone, Debug)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

struct Session {
    turns: Vec<Turn>,
    summary: String,
    last_access: Instant,
}

/// Cross-request conversation history, keyed by session id.
///
/// `get_session_context` returns a defensive copy (cloned `Vec`/`String`) so a reader
/// never observes a write landing mid-read.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn append_turn(&self, session_id: &str, turn: Turn);

    /// Returns `(turns, summary)` as of the moment of the call.
    async fn get_session_context(&self, session_id: &str) -> (Vec<Turn>, String);

    /// Replaces the stored summary and trims history to the newest `keep_n` turns.
    /// Returns the number of turns that were dropped.
    async fn compact(&self, session_id: &str, summary: String, keep_n: usize) -> usize;

    async fn delete(&self, session_id: &str);

    /// Drops sessions whose `last_access` is older than `ttl`. Not scheduled by this
    /// crate — a host process calls this periodically.
    async fn evict_expired(&self, ttl: Duration);
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append_turn(&self, session_id: &str, turn: Turn) {
        let mut entry = self.sessions.entry(session_id.to_string()).or_insert_with(|| Session {
            turns: Vec::new(),
            summary: String::new(),
            last_access: Instant::now(),
        });
        entry.turns.push(turn);
        entry.last_access = Instant::now();
    }

    async fn get_session_context(&self, session_id: &str) -> (Vec<Turn>, String) {
        match self.sessions.get(session_id) {
            Some(entry) => (entry.turns.clone(), entry.summary.clone()),
            None => (Vec::new(), String::new()),
        }
    }

    async fn compact(&self, session_id: &str, summary: String, keep_n: usize) -> usize {
        let Some(mut entry) = self.sessions.get_mut(session_id) else {
            return 0;
        };
        let dropped = entry.turns.len().saturating_sub(keep_n);
        if dropped > 0 {
            entry.turns.drain(0..dropped);
        }
        entry.summary = summary;
        entry.last_access = Instant::now();
        dropped
    }

    async fn delete(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    async fn evict_expired(&self, ttl: Duration) {
        self.sessions.retain(|_, s| s.last_access.elapsed() < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_read_round_trips() {
        let store = InMemorySessionStore::new();
        store
            .append_turn("s1", Turn { user: "hi".into(), assistant: "hello".into() })
            .await;
        let (turns, summary) = store.get_session_context("s1").await;
        assert_eq!(turns.len(), 1);
        assert!(summary.is_empty());
    }

    #[tokio::test]
    async fn missing_session_returns_empty_context() {
        let store = InMemorySessionStore::new();
        let (turns, summary) = store.get_session_context("missing").await;
        assert!(turns.is_empty());
        assert!(summary.is_empty());
    }

    #[tokio::test]
    async fn compact_trims_to_keep_n_and_sets_summary() {
        let store = InMemorySessionStore::new();
        for i in 0..5 {
            store
                .append_turn("s1", Turn { user: format!("u{i}"), assistant: format!("a{i}") })
                .await;
        }
        let dropped = store.compact("s1", "summary so far".into(), 2).await;
        assert_eq!(dropped, 3);
        let (turns, summary) = store.get_session_context("s1").await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].user, "u3");
        assert_eq!(summary, "summary so far");
    }

    #[tokio::test]
    async fn compact_is_idempotent_on_second_call_with_same_keep_n() {
        let store = InMemorySessionStore::new();
        for i in 0..5 {
            store
                .append_turn("s1", Turn { user: format!("u{i}"), assistant: format!("a{i}") })
                .await;
        }
        store.compact("s1", "first".into(), 2).await;
        let dropped_again = store.compact("s1", "first merged".into(), 2).await;
        assert_eq!(dropped_again, 0);
        let (turns, summary) = store.get_session_context("s1").await;
        assert_eq!(turns.len(), 2);
        assert_eq!(summary, "first merged");
    }

    #[tokio::test]
    async fn delete_clears_session() {
        let store = InMemorySessionStore::new();
        store.append_turn("s1", Turn { user: "a".into(), assistant: "b".into() }).await;
        store.delete("s1").await;
        let (turns, _) = store.get_session_context("s1").await;
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn evict_expired_drops_stale_sessions_only() {
        let store = InMemorySessionStore::new();
        store.append_turn("stale", Turn { user: "a".into(), assistant: "b".into() }).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.append_turn("fresh", Turn { user: "a".into(), assistant: "b".into() }).await;
        store.evict_expired(Duration::from_millis(10)).await;
        let (stale, _) = store.get_session_context("stale").await;
        let (fresh, _) = store.get_session_context("fresh").await;
        assert!(stale.is_empty());
        assert!(!fresh.is_empty());
    }
}
