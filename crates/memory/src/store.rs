//! The Memory Store facade — the single recall/remember path the agent
//! uses.
//!
//! Two invariants live here:
//! 1. Every recall is scoped to the owning user. The user filter is
//!    pushed into the index query AND re-checked on the results, so a
//!    buggy backend still cannot leak another user's records.
//! 2. A failing long-term index never fails the turn. Recall degrades to
//!    an empty result (short-term-only context) with a warning; remember
//!    logs and moves on.

use std::sync::Arc;
use tracing::{debug, warn};

use verdant_core::error::MemoryError;
use verdant_core::memory::{MemoryIndex, MemoryRecord, RecallQuery};
use verdant_core::message::{Turn, UserId};
use verdant_core::session::ConversationSession;

/// Facade over the short-term window and the long-term index.
pub struct MemoryStore {
    index: Arc<dyn MemoryIndex>,
    recall_limit: usize,
}

impl MemoryStore {
    pub fn new(index: Arc<dyn MemoryIndex>, recall_limit: usize) -> Self {
        Self {
            index,
            recall_limit: recall_limit.max(1),
        }
    }

    /// Append a turn to a session's short-term window (FIFO eviction).
    pub fn append(&self, session: &mut ConversationSession, turn: Turn) {
        session.append(turn);
    }

    /// The session's retained turns, chronological.
    pub fn recent(&self, session: &ConversationSession) -> Vec<Turn> {
        session.recent_turns()
    }

    /// Persist a completed exchange to the user's long-term partition.
    ///
    /// Failures are absorbed: the exchange is lost from long-term memory
    /// but the turn already succeeded from the user's point of view.
    pub async fn remember(
        &self,
        user: &UserId,
        question: &str,
        answer: &str,
        topic: Option<String>,
    ) {
        let record = MemoryRecord::exchange(user.clone(), question, answer, topic);
        match self.index.upsert(record).await {
            Ok(id) => debug!(user = %user, record_id = %id, "Exchange remembered"),
            Err(e) => warn!(user = %user, error = %e, "Failed to write long-term memory"),
        }
    }

    /// Ranked recall from the user's partition.
    ///
    /// An unreachable index degrades to an empty result so the loop
    /// continues with short-term context only.
    pub async fn recall(&self, user: &UserId, query: &str, k: usize) -> Vec<MemoryRecord> {
        let query = RecallQuery {
            user_id: user.clone(),
            text: query.to_string(),
            limit: k.max(1),
            min_score: 0.0,
        };

        match self.index.query(query).await {
            Ok(records) => {
                // Partition re-check: the index already filtered, but this
                // boundary is where the isolation invariant is enforced.
                let (kept, leaked): (Vec<_>, Vec<_>) =
                    records.into_iter().partition(|r| &r.user_id == user);
                if !leaked.is_empty() {
                    warn!(
                        user = %user,
                        leaked = leaked.len(),
                        backend = self.index.name(),
                        "Index returned records outside the user partition; dropped"
                    );
                }
                kept
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Long-term recall unavailable, continuing without it");
                Vec::new()
            }
        }
    }

    /// Recall with the store's configured default limit.
    pub async fn recall_default(&self, user: &UserId, query: &str) -> Vec<MemoryRecord> {
        self.recall(user, query, self.recall_limit).await
    }

    /// All long-term records for a user (operational surface).
    pub async fn records_for_user(&self, user: &UserId) -> Vec<MemoryRecord> {
        match self.index.records_for_user(user).await {
            Ok(records) => records,
            Err(e) => {
                warn!(user = %user, error = %e, "Failed to list user records");
                Vec::new()
            }
        }
    }

    /// Clear a user's long-term partition. Returns how many records were
    /// removed; the caller clears the short-term window.
    pub async fn clear_user(&self, user: &UserId) -> Result<usize, MemoryError> {
        self.index.delete_user(user).await
    }

    /// The backing index name (for status output).
    pub fn backend_name(&self) -> &str {
        self.index.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryIndex;
    use async_trait::async_trait;

    /// An index that always fails — exercises the degradation paths.
    struct BrokenIndex;

    #[async_trait]
    impl MemoryIndex for BrokenIndex {
        fn name(&self) -> &str {
            "broken"
        }
        async fn upsert(&self, _record: MemoryRecord) -> Result<String, MemoryError> {
            Err(MemoryError::Unavailable("index offline".into()))
        }
        async fn query(&self, _query: RecallQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
            Err(MemoryError::Unavailable("index offline".into()))
        }
        async fn records_for_user(&self, _user: &UserId) -> Result<Vec<MemoryRecord>, MemoryError> {
            Err(MemoryError::Unavailable("index offline".into()))
        }
        async fn delete_user(&self, _user: &UserId) -> Result<usize, MemoryError> {
            Err(MemoryError::Unavailable("index offline".into()))
        }
        async fn count(&self) -> Result<usize, MemoryError> {
            Err(MemoryError::Unavailable("index offline".into()))
        }
    }

    /// An index that ignores the partition filter — the facade must still
    /// not leak.
    struct LeakyIndex {
        inner: InMemoryIndex,
    }

    #[async_trait]
    impl MemoryIndex for LeakyIndex {
        fn name(&self) -> &str {
            "leaky"
        }
        async fn upsert(&self, record: MemoryRecord) -> Result<String, MemoryError> {
            self.inner.upsert(record).await
        }
        async fn query(&self, query: RecallQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
            // Deliberately returns every user's records.
            let mut all = Vec::new();
            for user in ["alice", "bob"] {
                all.extend(self.inner.records_for_user(&UserId::new(user)).await?);
            }
            let _ = query;
            Ok(all)
        }
        async fn records_for_user(&self, user: &UserId) -> Result<Vec<MemoryRecord>, MemoryError> {
            self.inner.records_for_user(user).await
        }
        async fn delete_user(&self, user: &UserId) -> Result<usize, MemoryError> {
            self.inner.delete_user(user).await
        }
        async fn count(&self) -> Result<usize, MemoryError> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn remember_then_recall() {
        let store = MemoryStore::new(Arc::new(InMemoryIndex::new()), 5);
        let user = UserId::new("u1");

        store
            .remember(&user, "How do I prune roses?", "Cut above outward buds.", None)
            .await;

        let results = store.recall(&user, "prune roses", 5).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("prune roses"));
    }

    #[tokio::test]
    async fn recall_isolated_per_user() {
        let store = MemoryStore::new(Arc::new(InMemoryIndex::new()), 5);
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        store.remember(&alice, "my tomato secret", "noted", None).await;
        store.remember(&bob, "my tomato problem", "noted", None).await;

        let results = store.recall(&alice, "tomato", 10).await;
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.user_id == alice));
    }

    #[tokio::test]
    async fn recall_drops_leaked_records() {
        let store = MemoryStore::new(
            Arc::new(LeakyIndex {
                inner: InMemoryIndex::new(),
            }),
            5,
        );
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        store.remember(&alice, "alice notes", "ok", None).await;
        store.remember(&bob, "bob notes", "ok", None).await;

        // The leaky backend returns both; the facade must drop bob's.
        let results = store.recall(&alice, "notes", 10).await;
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.user_id == alice));
    }

    #[tokio::test]
    async fn broken_index_degrades_to_empty() {
        let store = MemoryStore::new(Arc::new(BrokenIndex), 5);
        let user = UserId::new("u1");

        // remember: absorbed, no panic
        store.remember(&user, "q", "a", None).await;

        // recall: degrades to empty
        let results = store.recall(&user, "anything", 5).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn append_and_recent_delegate_to_session() {
        let store = MemoryStore::new(Arc::new(InMemoryIndex::new()), 5);
        let mut session = ConversationSession::new(UserId::new("u1"), 3);

        store.append(&mut session, Turn::user("one"));
        store.append(&mut session, Turn::agent("two"));

        let recent = store.recent(&session);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "one");
    }
}
