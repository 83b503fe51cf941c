//! Conversation session — the per-user short-term memory window.
//!
//! A session is created on a user's first message and holds the bounded
//! window of recent turns. The window uses plain FIFO eviction: recency is
//! the only signal, so once the window is full, appending a turn drops
//! exactly the oldest one.
//!
//! Sessions are strictly per-user and never shared. Concurrency control
//! (one in-flight turn per session) is the session registry's job in the
//! agent crate — this type is the data, not the lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::message::{Turn, UserId};

/// Default number of turns kept in the short-term window.
pub const DEFAULT_WINDOW: usize = 10;

/// A per-user conversation session with a bounded short-term window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// The owning user. Sessions are never shared across users.
    pub user_id: UserId,

    /// Recent turns, oldest first.
    turns: VecDeque<Turn>,

    /// Maximum number of turns retained.
    window: usize,

    /// When the session was created (first message from this user).
    pub created_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Create an empty session for a user with the given window size.
    ///
    /// A zero window is clamped to 1 so `append` always retains the
    /// newest turn.
    pub fn new(user_id: UserId, window: usize) -> Self {
        Self {
            user_id,
            turns: VecDeque::new(),
            window: window.max(1),
            created_at: Utc::now(),
        }
    }

    /// Append a turn, evicting the oldest if the window is full.
    pub fn append(&mut self, turn: Turn) {
        if self.turns.len() == self.window {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// The retained turns in chronological order.
    pub fn recent(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Clone the retained turns in chronological order.
    pub fn recent_turns(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Number of turns currently retained.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The configured window bound.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Drop all retained turns (used by the clear-history shortcut).
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
