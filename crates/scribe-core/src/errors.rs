//! Workflow error taxonomy.
//!
//! Every variant except invariant violations is recoverable: the dispatcher
//! converts it into a user-visible error view and the session stays resumable
//! from its last committed state.

use thiserror::Error;

use crate::session::WorkflowState;

/// Failure modes of the workflow core.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The action is not legal for the session's current state.
    /// Tolerated no-op — the transport may redeliver or race duplicate clicks.
    #[error("action '{action}' is not legal in state {state:?}")]
    IllegalTransition {
        /// State the session was in when the action arrived.
        state: WorkflowState,
        /// Name of the rejected action.
        action: &'static str,
    },

    /// A transition is already in flight for this conversation, or the
    /// session version moved since the action was acknowledged.
    #[error("a transition is already in flight for this conversation")]
    Busy,

    /// The upstream completion call failed or returned no usable text.
    #[error("completion service failed: {0}")]
    GenerationService(String),

    /// The completion returned text, but it could not be parsed into the
    /// structure the next state needs.
    #[error("could not parse generated text: {0}")]
    GenerationParse(String),

    /// The document sink failed; the transition was rolled back.
    #[error("failed to persist document: {0}")]
    Persistence(#[from] PersistenceError),

    /// The transition exceeded its deadline; the lock was force-released.
    #[error("transition timed out after {0}s")]
    Timeout(u64),

    /// The messaging transport rejected a send/update.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl WorkflowError {
    /// Short stable label, used as a metrics dimension.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IllegalTransition { .. } => "illegal_transition",
            Self::Busy => "busy",
            Self::GenerationService(_) => "generation_service",
            Self::GenerationParse(_) => "generation_parse",
            Self::Persistence(_) => "persistence",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
        }
    }
}

/// Error from the messaging transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP call itself failed.
    #[error("transport request failed: {0}")]
    Http(String),
    /// The transport API returned a business error code.
    #[error("transport API error {code}: {message}")]
    Api {
        /// Platform error code.
        code: i64,
        /// Platform error message.
        message: String,
    },
}

/// Error from the document-persistence collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PersistenceError {
    /// Downstream failure description.
    pub message: String,
}

impl PersistenceError {
    /// Build from any displayable downstream failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_labels() {
        assert_eq!(WorkflowError::Busy.kind(), "busy");
        assert_eq!(WorkflowError::Timeout(120).kind(), "timeout");
        assert_eq!(
            WorkflowError::Persistence(PersistenceError::new("doc create failed")).kind(),
            "persistence"
        );
    }

    #[test]
    fn illegal_transition_names_state_and_action() {
        let err = WorkflowError::IllegalTransition {
            state: WorkflowState::Direction,
            action: "select_topic",
        };
        let msg = err.to_string();
        assert!(msg.contains("select_topic"));
        assert!(msg.contains("Direction"));
    }
}
