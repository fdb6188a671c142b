//! Collaborator traits consumed by the workflow core.
//!
//! The messaging transport and the document sink are external systems; the
//! core only sees these seams. Both are treated as stateless and
//! idempotent-on-retry, so callers need no locking around them.

use async_trait::async_trait;

use crate::errors::{PersistenceError, TransportError};
use crate::ids::{ConversationId, MessageRef};
use crate::views::View;

/// Messaging transport: deliver views into a conversation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new view, returning a reference usable for later updates.
    async fn send_view(
        &self,
        conversation: &ConversationId,
        view: &View,
    ) -> Result<MessageRef, TransportError>;

    /// Replace the content of a previously sent view in place.
    async fn update_view(&self, message: &MessageRef, view: &View) -> Result<(), TransportError>;
}

/// Document-persistence sink: store text, hand back a durable link.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Persist a document and return its durable link.
    async fn persist_document(&self, text: &str, title: &str)
    -> Result<String, PersistenceError>;
}
