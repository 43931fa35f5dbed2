//! Per-user sessions and the in-memory session store.
//!
//! One session = one user's position in a flow plus the accumulated answer
//! bag. The store hands out per-user `tokio` mutexes; the dispatcher holds
//! the lock for the whole handling of one event (including a suspended
//! recommendation call), so events for the same user are serialized while
//! different users proceed concurrently. tokio's fair mutex queues a new
//! same-user event behind a pending call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::flow::answers::{AnswerBag, AnswerValue, Field};
use crate::flow::state::{Flow, FlowState};

/// Per-user mutable record: current position and collected answers.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: FlowState,
    pub answers: AnswerBag,
    pub started_at: DateTime<Utc>,
    pub last_event_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            state: FlowState::Idle,
            answers: AnswerBag::new(),
            started_at: now,
            last_event_at: now,
        }
    }

    /// The flow the current state belongs to, or `None` when idle.
    pub fn flow(&self) -> Option<Flow> {
        self.state.flow()
    }

    /// Atomically replace the state and merge parsed answer values.
    pub fn commit(
        &mut self,
        new_state: FlowState,
        updates: impl IntoIterator<Item = (Field, AnswerValue)>,
    ) {
        self.answers.merge(updates);
        self.state = new_state;
    }

    /// Reset to idle and discard all answers. Nothing survives a clear.
    pub fn clear(&mut self) {
        self.state = FlowState::Idle;
        self.answers.clear();
    }

    pub fn touch(&mut self) {
        self.last_event_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned mapping from user identity to session. Sessions are created lazily
/// on first event and live for the process lifetime.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or lazily create the session handle for a user. Never fails.
    pub fn session(&self, user_id: &str) -> Arc<tokio::sync::Mutex<Session>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            map.entry(user_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::new()))),
        )
    }

    /// Number of sessions created so far.
    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
