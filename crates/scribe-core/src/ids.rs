//! Branded ID newtypes.
//!
//! Plain `String`s for chat IDs and message IDs are easy to swap by accident
//! at call sites that take both. Newtypes make the compiler catch it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key identifying a conversation (chat) for the lifetime of that chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a transport-provided chat ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw ID as provided by the transport.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to a message previously sent through the transport,
/// usable for in-place updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(String);

impl MessageRef {
    /// Wrap a transport-provided message ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw message ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_round_trips_serde() {
        let id = ConversationId::new("oc_123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"oc_123\"");
        let back: ConversationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn message_ref_displays_raw_id() {
        let m = MessageRef::new("om_abc");
        assert_eq!(m.to_string(), "om_abc");
        assert_eq!(m.as_str(), "om_abc");
    }
}
