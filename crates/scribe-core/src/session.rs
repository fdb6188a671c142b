//! Per-conversation workflow session.
//!
//! One [`Session`] per conversation, living in process memory for the life of
//! the process. Field invariants:
//!
//! - `state` only advances forward or resets to `Direction` (the explicit
//!   "back"/"start over" transitions are the only way backward).
//! - `selected_topic` is set only in `Outline`, `Writing`, or `Done`.
//! - `outline` is set only in `Outline`, `Writing`, or `Done`; it may be
//!   regenerated while the state stays `Outline`.
//! - `version` increments on every committed transition and never otherwise.
//!
//! Mutation happens exclusively through the session store's commit path; the
//! methods here are the mutators that path applies.

use serde::{Deserialize, Serialize};

use crate::ids::ConversationId;

/// Number of topic candidates requested per generation step.
pub const TOPIC_CANDIDATE_COUNT: usize = 3;

/// Workflow step the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Waiting for the user to pick a content direction.
    Direction,
    /// Topic candidates generated; waiting for a pick or a regenerate.
    Topic,
    /// Outline generated; waiting for confirm / regenerate / back.
    Outline,
    /// Article generation and persistence in progress. Observed only while a
    /// `confirm_outline` transition is executing; never a committed state.
    Writing,
    /// Article persisted; workflow finished for this conversation.
    Done,
}

/// Per-conversation workflow state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Conversation this session belongs to.
    pub conversation: ConversationId,
    /// Current workflow step.
    pub state: WorkflowState,
    /// Chosen content category, once picked.
    pub direction: Option<String>,
    /// Last generated candidate set (0–3 entries).
    pub topic_candidates: Vec<String>,
    /// Topic the user selected.
    pub selected_topic: Option<String>,
    /// Last generated outline text.
    pub outline: Option<String>,
    /// Monotonically increasing transition counter. Used to detect and drop
    /// stale or duplicate actions.
    pub version: u64,
}

impl Session {
    /// Fresh session in `Direction` at version 0.
    #[must_use]
    pub fn new(conversation: ConversationId) -> Self {
        Self {
            conversation,
            state: WorkflowState::Direction,
            direction: None,
            topic_candidates: Vec::new(),
            selected_topic: None,
            outline: None,
            version: 0,
        }
    }

    /// Enter `Topic` with a fresh candidate set. Clears any downstream
    /// fields so the invariants hold after a regenerate-from-`Topic`.
    pub fn enter_topic(&mut self, direction: impl Into<String>, candidates: Vec<String>) {
        self.state = WorkflowState::Topic;
        self.direction = Some(direction.into());
        self.topic_candidates = candidates;
        self.selected_topic = None;
        self.outline = None;
    }

    /// Enter `Outline` with a selected topic and its generated outline.
    pub fn enter_outline(&mut self, topic: impl Into<String>, outline: impl Into<String>) {
        self.state = WorkflowState::Outline;
        self.selected_topic = Some(topic.into());
        self.outline = Some(outline.into());
    }

    /// Replace the outline while staying in `Outline`.
    pub fn replace_outline(&mut self, outline: impl Into<String>) {
        self.outline = Some(outline.into());
    }

    /// Enter the terminal `Done` state.
    pub fn finish(&mut self) {
        self.state = WorkflowState::Done;
    }

    /// Reset to a fresh `Direction` session. The version is preserved — the
    /// store's commit path increments it like any other transition.
    pub fn reset(&mut self) {
        self.state = WorkflowState::Direction;
        self.direction = None;
        self.topic_candidates.clear();
        self.selected_topic = None;
        self.outline = None;
    }

    /// Check the field invariants for the current state. Violations are
    /// programming errors, not recoverable conditions; this exists for tests.
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        match self.state {
            WorkflowState::Direction => {
                self.selected_topic.is_none() && self.outline.is_none()
            }
            WorkflowState::Topic => {
                self.direction.is_some()
                    && self.topic_candidates.len() <= TOPIC_CANDIDATE_COUNT
                    && self.selected_topic.is_none()
                    && self.outline.is_none()
            }
            WorkflowState::Outline | WorkflowState::Writing | WorkflowState::Done => {
                self.selected_topic.is_some() && self.outline.is_some()
            }
        }
    }
}
