//! File-based long-term index — persistent JSONL storage.
//!
//! Each line is one JSON-encoded `MemoryRecord`. Records load into memory
//! on creation and flush to disk on every mutation, giving fast reads
//! with durable writes. Corrupt lines are skipped with a warning rather
//! than poisoning the whole store.
//!
//! Default location: `~/.verdant/memory/records.jsonl`

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use verdant_core::error::MemoryError;
use verdant_core::memory::{MemoryIndex, MemoryRecord, RecallQuery};
use verdant_core::message::UserId;

use crate::in_memory::rank_partition;

/// A file-backed index using JSONL (one JSON object per line).
pub struct FileIndex {
    path: PathBuf,
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl FileIndex {
    /// Create a new file-based index at the given path.
    ///
    /// If the file exists, records are loaded from it; otherwise the
    /// index starts empty and the file is created on first write.
    pub fn new(path: PathBuf) -> Self {
        let records = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = records.len(), "File memory index loaded");
        Self {
            path,
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Default path: `~/.verdant/memory/records.jsonl`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".verdant")
            .join("memory")
            .join("records.jsonl")
    }

    fn load_from_disk(path: &PathBuf) -> Vec<MemoryRecord> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // File doesn't exist yet — start empty
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<MemoryRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted memory record");
                    None
                }
            })
            .collect()
    }

    /// Flush all records to disk as JSONL.
    async fn flush(&self) -> Result<(), MemoryError> {
        let records = self.records.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for record in records.iter() {
            let line = serde_json::to_string(record).map_err(|e| {
                MemoryError::Storage(format!("Failed to serialize memory record: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl MemoryIndex for FileIndex {
    fn name(&self) -> &str {
        "file"
    }

    async fn upsert(&self, mut record: MemoryRecord) -> Result<String, MemoryError> {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        let id = record.id.clone();
        {
            let mut records = self.records.write().await;
            records.retain(|r| r.id != id);
            records.push(record);
        }
        self.flush().await?;
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
        let removed = {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|r| &r.user_id != user);
            before - records.len()
        };
        if removed > 0 {
            self.flush().await?;
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(user: &str, text: &str) -> MemoryRecord {
        MemoryRecord::exchange(UserId::new(user), text, "noted", None)
    }

    fn temp_path() -> PathBuf {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp); // Close file so the index owns it
        path
    }

    #[tokio::test]
    async fn store_and_reload_persists() {
        let path = temp_path();

        let index = FileIndex::new(path.clone());
        let id = index.upsert(record("u1", "rose pruning notes")).await.unwrap();
        assert!(!id.is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("rose pruning notes"));

        // Reload from disk — record survives
        let index2 = FileIndex::new(path);
        assert_eq!(index2.count().await.unwrap(), 1);
        let all = index2.records_for_user(&UserId::new("u1")).await.unwrap();
        assert!(all[0].text.contains("rose pruning"));
    }

    #[tokio::test]
    async fn delete_user_persists() {
        let path = temp_path();

        let index = FileIndex::new(path.clone());
        index.upsert(record("u1", "one")).await.unwrap();
        index.upsert(record("u2", "two")).await.unwrap();
        assert_eq!(index.delete_user(&UserId::new("u1")).await.unwrap(), 1);

        let index2 = FileIndex::new(path);
        assert_eq!(index2.count().await.unwrap(), 1);
        assert!(
            index2
                .records_for_user(&UserId::new("u1"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn query_scoped_to_user() {
        let path = temp_path();
        let index = FileIndex::new(path);
        index.upsert(record("a", "tomato blight treatment")).await.unwrap();
        index.upsert(record("b", "tomato fertilizer")).await.unwrap();

        let results = index
            .query(RecallQuery {
                user_id: UserId::new("a"),
                text: "tomato".into(),
                limit: 10,
                min_score: 0.0,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].user_id, UserId::new("a"));
    }

    #[tokio::test]
    async fn handles_missing_file_gracefully() {
        let path = PathBuf::from("/tmp/verdant_test_nonexistent_records.jsonl");
        let _ = std::fs::remove_file(&path);
        let index = FileIndex::new(path);
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn handles_corrupted_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"{{"id":"1","user_id":"u1","text":"valid","created_at":"2026-01-01T00:00:00Z","score":0.0}}"#
        )
        .unwrap();
        writeln!(tmp, "this is not json").unwrap();
        writeln!(
            tmp,
            r#"{{"id":"2","user_id":"u1","text":"also valid","created_at":"2026-01-01T00:00:00Z","score":0.0}}"#
        )
        .unwrap();
        let path = tmp.path().to_path_buf();

        let index = FileIndex::new(path);
        // Loads the 2 valid records, skips the corrupted line
        assert_eq!(index.count().await.unwrap(), 2);
    }
}
