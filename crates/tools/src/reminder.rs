//! Reminder tool — durable watering reminders with retry dedupe.
//!
//! Reminders persist to a JSON file so they survive process restarts.
//! Scheduling is idempotent under retry: a second request with the same
//! (user, plant, interval) signature inside the dedupe window returns the
//! existing reminder instead of creating a duplicate. The signature is a
//! SHA-256 over the normalized call parameters, stored on the entry so
//! dedupe also works across restarts.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use verdant_core::error::ToolError;
use verdant_core::message::UserId;
use verdant_core::tool::{Tool, ToolResult};

/// One persisted reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub id: String,
    pub user_id: UserId,
    pub plant: String,
    pub interval_days: u32,
    pub created_at: DateTime<Utc>,
    /// Dedupe signature over (user, plant, interval).
    pub signature: String,
}

/// Compute the dedupe signature for a reminder request.
fn signature(user: &UserId, plant: &str, interval_days: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(plant.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(interval_days.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Durable reminder storage shared by the tool and the operational
/// surface (reminder listing).
pub struct ReminderStore {
    path: PathBuf,
    entries: RwLock<Vec<ReminderEntry>>,
    dedupe_window: ChronoDuration,
}

impl ReminderStore {
    /// Open (or create) the store at `path`.
    pub fn new(path: PathBuf, dedupe_hours: u64) -> Self {
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "Reminder store loaded");
        Self {
            path,
            entries: RwLock::new(entries),
            dedupe_window: ChronoDuration::hours(dedupe_hours as i64),
        }
    }

    /// Default path: `~/.verdant/reminders.json`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".verdant").join("reminders.json")
    }

    fn load_from_disk(path: &PathBuf) -> Vec<ReminderEntry> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Reminder file unreadable, starting empty");
                Vec::new()
            }
        }
    }

    async fn flush(&self) -> std::io::Result<()> {
        let entries = self.entries.read().await;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*entries)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        std::fs::write(&self.path, json)
    }

    /// Add a reminder, deduping identical requests within the window.
    ///
    /// Returns the entry and whether it was newly created.
    pub async fn add(
        &self,
        user: &UserId,
        plant: &str,
        interval_days: u32,
    ) -> std::io::Result<(ReminderEntry, bool)> {
        let sig = signature(user, plant, interval_days);
        let now = Utc::now();

        {
            let entries = self.entries.read().await;
            if let Some(existing) = entries
                .iter()
                .find(|e| e.signature == sig && now - e.created_at <= self.dedupe_window)
            {
                debug!(user = %user, plant, "Duplicate reminder within dedupe window");
                return Ok((existing.clone(), false));
            }
        }

        let entry = ReminderEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user.clone(),
            plant: plant.trim().to_string(),
            interval_days,
            created_at: now,
            signature: sig,
        };

        self.entries.write().await.push(entry.clone());
        self.flush().await?;
        Ok((entry, true))
    }

    /// All reminders for one user, oldest first.
    pub async fn list_for(&self, user: &UserId) -> Vec<ReminderEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| &e.user_id == user)
            .cloned()
            .collect()
    }

    /// Total reminder count (status surface).
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// The agent-facing reminder tool.
pub struct ReminderTool {
    store: Arc<ReminderStore>,
}

impl ReminderTool {
    pub fn new(store: Arc<ReminderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReminderTool {
    fn name(&self) -> &str {
        "reminder"
    }

    fn description(&self) -> &str {
        "Schedule a recurring watering reminder for a plant. \
         Takes the plant name and the interval in days."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "plant": {
                    "type": "string",
                    "description": "Which plant to water, e.g. 'tomatoes'"
                },
                "interval_days": {
                    "type": "integer",
                    "description": "Days between waterings, 1-365"
                }
            },
            "required": ["plant", "interval_days"]
        })
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
        user: &UserId,
    ) -> Result<ToolResult, ToolError> {
        let invalid = |reason: &str| ToolError::InvalidArguments {
            tool_name: "reminder".into(),
            reason: reason.into(),
        };

        let plant = arguments["plant"]
            .as_str()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| invalid("missing 'plant'"))?;

        let interval_days = arguments["interval_days"]
            .as_u64()
            .filter(|d| (1..=365).contains(d))
            .ok_or_else(|| invalid("'interval_days' must be between 1 and 365"))?
            as u32;

        let (entry, created) =
            self.store
                .add(user, plant, interval_days)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "reminder".into(),
                    reason: format!("could not persist reminder: {e}"),
                })?;

        let output = if created {
            format!("Reminder set: water {} every {} days.", entry.plant, entry.interval_days)
        } else {
            format!(
                "That reminder already exists: water {} every {} days.",
                entry.plant, entry.interval_days
            )
        };

        Ok(ToolResult::ok(
            output,
            Some(serde_json::json!({"id": entry.id, "created": created})),
        ))
    }
}
