//! In-memory long-term index — for tests and ephemeral sessions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use verdant_core::error::MemoryError;
use verdant_core::memory::{MemoryIndex, MemoryRecord, RecallQuery};
use verdant_core::message::UserId;

use crate::scoring::term_relevance;

/// An index that keeps all records in a Vec. Nothing survives a restart.
pub struct InMemoryIndex {
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Rank one user's records against a query. Shared by both backends.
pub(crate) fn rank_partition(records: &[MemoryRecord], query: &RecallQuery) -> Vec<MemoryRecord> {
    let mut results: Vec<MemoryRecord> = records
        .iter()
        .filter(|r| r.user_id == query.user_id)
        .cloned()
        .map(|mut r| {
            r.score = term_relevance(&r.text, &query.text);
            r
        })
        .filter(|r| r.score > 0.0 && r.score >= query.min_score)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(query.limit);
    results
}

#[async_trait]
impl MemoryIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn upsert(&self, mut record: MemoryRecord) -> Result<String, MemoryError> {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        let id = record.id.clone();
        let mut records = self.records.write().await;
        records.retain(|r| r.id != id);
        records.push(record);
        Ok(id)
    }

    async fn query(&self, query: RecallQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        Ok(rank_partition(&records, &query))
    }

    async fn records_for_user(&self, user: &UserId) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| &r.user_id == user)
            .cloned()
            .collect())
    }

    async fn delete_user(&self, user: &UserId) -> Result<usize, MemoryError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| &r.user_id != user);
        Ok(before - records.len())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, text: &str) -> MemoryRecord {
        MemoryRecord::exchange(UserId::new(user), text, "noted", None)
    }

    fn query(user: &str, text: &str) -> RecallQuery {
        RecallQuery {
            user_id: UserId::new(user),
            text: text.into(),
            limit: 10,
            min_score: 0.0,
        }
    }

    #[tokio::test]
    async fn upsert_assigns_id() {
        let index = InMemoryIndex::new();
        let id = index.upsert(record("u1", "tomato tips")).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn query_ranks_by_relevance() {
        let index = InMemoryIndex::new();
        index.upsert(record("u1", "tomato watering schedule")).await.unwrap();
        index.upsert(record("u1", "orchid humidity")).await.unwrap();
        index.upsert(record("u1", "tomato and basil planting")).await.unwrap();

        let results = index.query(query("u1", "tomato watering")).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].text.contains("tomato watering"));
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn query_never_crosses_users() {
        let index = InMemoryIndex::new();
        index.upsert(record("alice", "my roses are blooming")).await.unwrap();
        index.upsert(record("bob", "my roses are dying")).await.unwrap();

        let results = index.query(query("alice", "roses")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].user_id, UserId::new("alice"));
    }

    #[tokio::test]
    async fn query_respects_min_score() {
        let index = InMemoryIndex::new();
        index.upsert(record("u1", "basil")).await.unwrap();

        let mut q = query("u1", "completely unrelated");
        q.min_score = 0.5;
        let results = index.query(q).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn delete_user_removes_only_theirs() {
        let index = InMemoryIndex::new();
        index.upsert(record("a", "one")).await.unwrap();
        index.upsert(record("a", "two")).await.unwrap();
        index.upsert(record("b", "three")).await.unwrap();

        let removed = index.delete_user(&UserId::new("a")).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_replaces_same_id() {
        let index = InMemoryIndex::new();
        let mut r = record("u1", "first");
        r.id = "fixed".into();
        index.upsert(r.clone()).await.unwrap();
        r.text = "second".into();
        index.upsert(r).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let all = index.records_for_user(&UserId::new("u1")).await.unwrap();
        assert_eq!(all[0].text, "second");
    }
}
