//! Session store: the single shared-mutable-state boundary.
//!
//! Maps `ConversationId → Session` with atomic get-or-create and a
//! compare-and-swap-style update keyed on the session version. At most one
//! transition may be in flight per conversation; everyone else sees
//! [`WorkflowError::Busy`]. Mutation happens only through a
//! [`TransitionGuard`]'s `commit`, which increments the version; `abort` (or
//! dropping the guard, e.g. when a timed-out future is cancelled) releases
//! the in-flight mark without touching state.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use metrics::gauge;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use scribe_core::errors::WorkflowError;
use scribe_core::ids::ConversationId;
use scribe_core::session::Session;

/// In-flight transitions gauge.
const TRANSITIONS_IN_FLIGHT: &str = "workflow_transitions_in_flight";

/// Per-conversation session store.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<ConversationId, Session>,
    /// Conversations with a transition currently in flight.
    in_flight: Mutex<HashSet<ConversationId>>,
}

impl SessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Snapshot of the conversation's session, creating a fresh `Direction`
    /// session at version 0 if none exists. Never fails.
    pub fn get_or_create(&self, conversation: &ConversationId) -> Session {
        self.sessions
            .entry(conversation.clone())
            .or_insert_with(|| Session::new(conversation.clone()))
            .clone()
    }

    /// Whether a transition is currently in flight for this conversation.
    /// Advisory — the authoritative check is [`Self::try_begin_transition`].
    pub fn is_in_flight(&self, conversation: &ConversationId) -> bool {
        self.in_flight.lock().contains(conversation)
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Try to acquire the conversation's transition lock.
    ///
    /// Fails with [`WorkflowError::Busy`] if a transition is already in
    /// flight, or if `expected_version` is given and the session has moved
    /// past it (a stale or duplicate action).
    #[instrument(skip(self), fields(conversation = %conversation))]
    pub fn try_begin_transition(
        self: &Arc<Self>,
        conversation: &ConversationId,
        expected_version: Option<u64>,
    ) -> Result<TransitionGuard, WorkflowError> {
        let mut in_flight = self.in_flight.lock();
        if in_flight.contains(conversation) {
            return Err(WorkflowError::Busy);
        }
        let session = self.get_or_create(conversation);
        if let Some(expected) = expected_version {
            if session.version != expected {
                debug!(
                    expected,
                    actual = session.version,
                    "stale action version, dropping"
                );
                return Err(WorkflowError::Busy);
            }
        }
        let _ = in_flight.insert(conversation.clone());
        #[allow(clippy::cast_precision_loss)]
        gauge!(TRANSITIONS_IN_FLIGHT).set(in_flight.len() as f64);
        drop(in_flight);

        Ok(TransitionGuard {
            store: Arc::clone(self),
            conversation: conversation.clone(),
            snapshot: session,
            released: false,
        })
    }

    /// Release the in-flight mark. Internal; reached via guard commit/abort
    /// or drop.
    fn release(&self, conversation: &ConversationId) {
        let mut in_flight = self.in_flight.lock();
        let _ = in_flight.remove(conversation);
        #[allow(clippy::cast_precision_loss)]
        gauge!(TRANSITIONS_IN_FLIGHT).set(in_flight.len() as f64);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive handle on one conversation's transition.
///
/// Dropping the guard without committing behaves like `abort` — the
/// in-flight mark is released on every exit path, including cancellation of
/// the future that owns it.
#[derive(Debug)]
pub struct TransitionGuard {
    store: Arc<SessionStore>,
    conversation: ConversationId,
    snapshot: Session,
    released: bool,
}

impl TransitionGuard {
    /// The session as it was when the lock was acquired.
    #[must_use]
    pub fn snapshot(&self) -> &Session {
        &self.snapshot
    }

    /// Apply `mutator` to the stored session, increment its version, and
    /// release the lock. Returns the committed session.
    pub fn commit(mut self, mutator: impl FnOnce(&mut Session)) -> Session {
        let committed = {
            let mut entry = self
                .store
                .sessions
                .entry(self.conversation.clone())
                .or_insert_with(|| Session::new(self.conversation.clone()));
            mutator(entry.value_mut());
            entry.value_mut().version += 1;
            entry.value().clone()
        };
        // Entry ref is gone before we take the in-flight lock.
        self.store.release(&self.conversation);
        self.released = true;
        debug!(conversation = %self.conversation, version = committed.version, "transition committed");
        committed
    }

    /// Release the lock without mutating state.
    pub fn abort(mut self) {
        self.store.release(&self.conversation);
        self.released = true;
    }
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        if !self.released {
            self.store.release(&self.conversation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use scribe_core::session::WorkflowState;

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new())
    }

    fn conv(id: &str) -> ConversationId {
        ConversationId::new(id)
    }

    #[test]
    fn get_or_create_returns_fresh_direction_session() {
        let store = store();
        let session = store.get_or_create(&conv("c1"));
        assert_eq!(session.state, WorkflowState::Direction);
        assert_eq!(session.version, 0);
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let store = store();
        let _ = store.get_or_create(&conv("c1"));
        let _ = store.get_or_create(&conv("c1"));
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn begin_commit_increments_version_and_releases() {
        let store = store();
        let guard = store.try_begin_transition(&conv("c1"), Some(0)).unwrap();
        assert!(store.is_in_flight(&conv("c1")));

        let committed = guard.commit(|s| s.enter_topic("d", vec!["t".into()]));
        assert_eq!(committed.version, 1);
        assert_eq!(committed.state, WorkflowState::Topic);
        assert!(!store.is_in_flight(&conv("c1")));
    }

    #[test]
    fn second_begin_while_in_flight_is_busy() {
        let store = store();
        let _guard = store.try_begin_transition(&conv("c1"), None).unwrap();
        let err = store.try_begin_transition(&conv("c1"), None).unwrap_err();
        assert_matches!(err, WorkflowError::Busy);
    }

    #[test]
    fn version_mismatch_is_busy() {
        let store = store();
        let guard = store.try_begin_transition(&conv("c1"), Some(0)).unwrap();
        let _ = guard.commit(|_| {});
        // An action acknowledged against version 0 arrives after the commit.
        let err = store.try_begin_transition(&conv("c1"), Some(0)).unwrap_err();
        assert_matches!(err, WorkflowError::Busy);
    }

    #[test]
    fn abort_releases_without_mutating() {
        let store = store();
        let guard = store.try_begin_transition(&conv("c1"), Some(0)).unwrap();
        guard.abort();
        assert!(!store.is_in_flight(&conv("c1")));
        assert_eq!(store.get_or_create(&conv("c1")).version, 0);
    }

    #[test]
    fn dropping_guard_releases_lock() {
        let store = store();
        {
            let _guard = store.try_begin_transition(&conv("c1"), None).unwrap();
            assert!(store.is_in_flight(&conv("c1")));
        }
        assert!(!store.is_in_flight(&conv("c1")));
        let _relock = store.try_begin_transition(&conv("c1"), None).unwrap();
    }

    #[test]
    fn conversations_lock_independently() {
        let store = store();
        let _g1 = store.try_begin_transition(&conv("c1"), None).unwrap();
        let _g2 = store.try_begin_transition(&conv("c2"), None).unwrap();
        assert!(store.is_in_flight(&conv("c1")));
        assert!(store.is_in_flight(&conv("c2")));
    }

    #[test]
    fn snapshot_reflects_state_at_acquisition() {
        let store = store();
        let guard = store.try_begin_transition(&conv("c1"), Some(0)).unwrap();
        assert_eq!(guard.snapshot().version, 0);
        assert_eq!(guard.snapshot().state, WorkflowState::Direction);
        guard.abort();
    }
}
