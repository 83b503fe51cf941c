//! Session registry — one session per user, serialized per user.
//!
//! Exactly one `ConversationSession` exists per user ID; it is created on
//! the user's first message and guarded by a per-session async mutex.
//! Holding the lock for the whole turn serializes same-user processing
//! (a session's window and scratchpad are not safe for concurrent
//! mutation) while different users proceed concurrently. A task awaiting
//! an external call holds only its own session's lock, so it never blocks
//! other users.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use verdant_core::message::UserId;
use verdant_core::session::ConversationSession;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationSession>>>>,
    window: usize,
}

impl SessionRegistry {
    /// Create a registry whose sessions use the given short-term window.
    pub fn new(window: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            window,
        }
    }

    /// Get the user's session, creating it on first contact.
    ///
    /// The same Arc is returned for every call with the same user ID, so
    /// locking it serializes that user's turns.
    pub async fn get_or_create(&self, user: &UserId) -> Arc<Mutex<ConversationSession>> {
        // Fast path: session already exists.
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(user.as_str()) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user.as_str().to_string())
            .or_insert_with(|| {
                debug!(user = %user, "Creating session");
                Arc::new(Mutex::new(ConversationSession::new(
                    user.clone(),
                    self.window,
                )))
            })
            .clone()
    }

    /// Clear a user's short-term window (clear-history shortcut).
    /// Returns whether the user had a session.
    pub async fn clear(&self, user: &UserId) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(user.as_str()) {
            Some(session) => {
                session.lock().await.clear();
                true
            }
            None => false,
        }
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use verdant_core::message::Turn;

    #[tokio::test]
    async fn one_session_per_user() {
        let registry = SessionRegistry::new(10);
        let user = UserId::new("u1");

        let a = registry.get_or_create(&user).await;
        let b = registry.get_or_create(&user).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.count().await, 1);

        registry.get_or_create(&UserId::new("u2")).await;
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn sessions_use_configured_window() {
        let registry = SessionRegistry::new(2);
        let session = registry.get_or_create(&UserId::new("u1")).await;
        let mut guard = session.lock().await;
        for i in 0..5 {
            guard.append(Turn::user(format!("{i}")));
        }
        assert_eq!(guard.len(), 2);
    }

    #[tokio::test]
    async fn same_user_turns_serialize() {
        let registry = Arc::new(SessionRegistry::new(10));
        let user = UserId::new("u1");

        // Task 1 takes the session lock, holds it while "working", then
        // appends its turn. Task 2 must observe that turn.
        let session = registry.get_or_create(&user).await;

        let t1 = {
            let session = session.clone();
            tokio::spawn(async move {
                let mut guard = session.lock().await;
                tokio::time::sleep(Duration::from_millis(50)).await;
                guard.append(Turn::user("first message"));
                guard.append(Turn::agent("first reply"));
            })
        };

        // Give task 1 time to take the lock first.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let t2 = {
            let registry = registry.clone();
            let user = user.clone();
            tokio::spawn(async move {
                let session = registry.get_or_create(&user).await;
                let guard = session.lock().await;
                // By the time we hold the lock, the first turn is complete.
                guard.recent_turns()
            })
        };

        t1.await.unwrap();
        let seen = t2.await.unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].text, "first message");
    }

    #[tokio::test]
    async fn clear_empties_window_but_keeps_session() {
        let registry = SessionRegistry::new(10);
        let user = UserId::new("u1");

        let session = registry.get_or_create(&user).await;
        session.lock().await.append(Turn::user("hello"));

        assert!(registry.clear(&user).await);
        assert_eq!(session.lock().await.len(), 0);
        assert_eq!(registry.count().await, 1);

        assert!(!registry.clear(&UserId::new("nobody")).await);
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let registry = Arc::new(SessionRegistry::new(10));

        let a = registry.get_or_create(&UserId::new("a")).await;
        let _hold = a.lock().await; // user A's turn in flight

        // User B's session is still immediately lockable.
        let b = registry.get_or_create(&UserId::new("b")).await;
        let acquired = tokio::time::timeout(Duration::from_millis(20), b.lock()).await;
        assert!(acquired.is_ok());
    }
}
