//! Turn and user identity value objects.
//!
//! A `Turn` is one user or agent message within a session. Turns are
//! immutable once appended to a session — correction happens by appending
//! new turns, never by editing history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies a user across channels. Platform-specific IDs (a Discord
/// snowflake, a CLI login) are stringified by the gateway before they
/// reach the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The advisor agent
    Agent,
}

/// A single exchange turn within a conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who sent this turn
    pub role: Role,

    /// The text content
    pub text: String,

    /// When the turn was appended
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an agent turn stamped now.
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
