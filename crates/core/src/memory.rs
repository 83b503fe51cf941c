//! Long-term memory contract — a per-user similarity index.
//!
//! The index stores one record per completed exchange and answers ranked
//! recall queries. Every query carries the owning user's ID; an
//! implementation must never return a record written under a different
//! user. The `MemoryStore` facade in the memory crate re-checks this on
//! every read — the partition filter is enforced at the query layer, not
//! trusted to caller discipline.
//!
//! A production deployment would back this trait with a real vector
//! database; the bundled implementations are an in-memory index and a
//! durable JSONL file index with keyword relevance scoring.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::message::UserId;

/// A single long-term memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique ID for this record.
    pub id: String,

    /// The owning user. Records are never visible across users.
    pub user_id: UserId,

    /// Embedding-ready text of the exchange.
    pub text: String,

    /// Topic label (usually the plan intent that produced the exchange).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// When this record was written.
    pub created_at: DateTime<Utc>,

    /// Relevance score (set by recall operations).
    #[serde(default)]
    pub score: f32,
}

impl MemoryRecord {
    /// Build a record for a completed exchange. The ID is assigned by the
    /// index on upsert when left empty.
    pub fn exchange(
        user_id: UserId,
        question: &str,
        answer: &str,
        topic: Option<String>,
    ) -> Self {
        Self {
            id: String::new(),
            user_id,
            text: format!("User: {question}\nAdvisor: {answer}"),
            topic,
            created_at: Utc::now(),
            score: 0.0,
        }
    }
}

/// A ranked recall query, always scoped to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallQuery {
    /// The user whose partition to search.
    pub user_id: UserId,

    /// The query text.
    pub text: String,

    /// Maximum number of results.
    pub limit: usize,

    /// Minimum relevance score threshold.
    #[serde(default)]
    pub min_score: f32,
}

/// The long-term memory index contract.
///
/// Implementations: in-memory (tests/ephemeral), JSONL file (durable).
#[async_trait]
pub trait MemoryIndex: Send + Sync {
    /// The backend name (e.g. "in_memory", "file").
    fn name(&self) -> &str;

    /// Store a record, returning its ID.
    async fn upsert(&self, record: MemoryRecord) -> std::result::Result<String, MemoryError>;

    /// Ranked recall within the query's user partition.
    async fn query(
        &self,
        query: RecallQuery,
    ) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// All records for one user, oldest first (operational surface:
    /// plant listing, history export).
    async fn records_for_user(
        &self,
        user: &UserId,
    ) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Delete every record belonging to one user. Returns how many were
    /// removed.
    async fn delete_user(&self, user: &UserId) -> std::result::Result<usize, MemoryError>;

    /// Total record count across all users.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;
}
