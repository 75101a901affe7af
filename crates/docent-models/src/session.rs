//! In-memory per-user conversation store.
//!
//! One `SessionHandle` per user ID, created lazily on first contact and
//! mutated in place by every subsequent exchange. Nothing is ever
//! evicted; a session lives until the user issues the reset command or
//! the process exits. Durability is out of scope; state is lost on
//! restart.
//!
//! Thread-safe via `RwLock`: in steady state only the worker mutates,
//! but the reset path runs on the event-intake side, so the store must
//! tolerate concurrent read/reset.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::client::ChatMessage;

/// A single user's conversation state.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    /// Alternating user/assistant turns, oldest first. The system
    /// prompt is not stored here; the backend prepends it per call.
    pub messages: Vec<ChatMessage>,
    /// When this session was first created.
    pub created_at: DateTime<Utc>,
    /// When this session last changed.
    pub updated_at: DateTime<Utc>,
}

impl SessionHandle {
    fn new() -> Self {
        let now = Utc::now();
        SessionHandle {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Maps `user_id` → [`SessionHandle`].
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    /// The user's conversation so far (empty if no session exists yet).
    pub fn history(&self, user_id: &str) -> Vec<ChatMessage> {
        let sessions = self.sessions.read().unwrap();
        sessions
            .get(user_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Record one user/assistant exchange, creating the session on
    /// first contact.
    pub fn record(&self, user_id: &str, user_msg: &str, assistant_msg: &str) {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(SessionHandle::new);
        session.messages.push(ChatMessage::user(user_msg));
        session.messages.push(ChatMessage::assistant(assistant_msg));
        session.updated_at = Utc::now();
    }

    /// Drop the user's session. Returns `true` if one existed.
    pub fn reset(&self, user_id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(user_id).is_some()
    }

    /// Whether the user currently has a session.
    pub fn contains(&self, user_id: &str) -> bool {
        let sessions = self.sessions.read().unwrap();
        sessions.contains_key(user_id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        let sessions = self.sessions.read().unwrap();
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
