//! Typed action payloads.
//!
//! Card buttons carry a small key-value bag that the transport echoes back
//! verbatim on click. Rather than passing that loosely-typed bag through the
//! core, the ingress boundary parses it into one [`Action`] variant per
//! button, so each transition's required fields are statically present.
//!
//! Regenerate actions carry their direction/topic in the payload (as the
//! original buttons do) so redelivered clicks stay self-contained.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// One user interaction, as delivered by a button click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Pick a content direction (from `Direction`).
    SelectDirection {
        /// Chosen content category.
        direction: String,
    },
    /// Regenerate the candidate set (from `Topic`).
    RegenerateTopics {
        /// Direction the candidates belong to.
        direction: String,
    },
    /// Pick one topic candidate (from `Topic`).
    SelectTopic {
        /// Chosen topic title.
        topic: String,
    },
    /// Regenerate the outline (from `Outline`).
    RegenerateOutline {
        /// Topic the outline belongs to.
        topic: String,
    },
    /// Accept the outline and produce + persist the article (from `Outline`).
    ConfirmOutline {
        /// Confirmed topic title.
        topic: String,
        /// Confirmed outline text.
        outline: String,
    },
    /// Discard topic and outline, go back to picking a direction.
    BackToDirection,
    /// Reset the session to a fresh `Direction`, legal from any state.
    StartOver,
}

impl Action {
    /// Wire name of the action, as carried in the button payload.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectDirection { .. } => "select_direction",
            Self::RegenerateTopics { .. } => "regenerate_topics",
            Self::SelectTopic { .. } => "select_topic",
            Self::RegenerateOutline { .. } => "regenerate_outline",
            Self::ConfirmOutline { .. } => "confirm_outline",
            Self::BackToDirection => "back_to_direction",
            Self::StartOver => "start_over",
        }
    }

    /// Parse a button value bag (`{"action": "...", ...}`) into a typed
    /// action. Returns `None` when the name is unknown or a required field
    /// is missing — the ingress treats that as a non-event.
    #[must_use]
    pub fn from_button_value(value: &Value) -> Option<Self> {
        let name = value.get("action")?.as_str()?;
        let field = |key: &str| -> Option<String> {
            value.get(key).and_then(Value::as_str).map(str::to_string)
        };
        match name {
            "select_direction" => Some(Self::SelectDirection {
                direction: field("direction")?,
            }),
            "regenerate_topics" => Some(Self::RegenerateTopics {
                direction: field("direction")?,
            }),
            "select_topic" => Some(Self::SelectTopic {
                topic: field("topic")?,
            }),
            "regenerate_outline" => Some(Self::RegenerateOutline {
                topic: field("topic")?,
            }),
            "confirm_outline" => Some(Self::ConfirmOutline {
                topic: field("topic")?,
                outline: field("outline")?,
            }),
            "back_to_direction" => Some(Self::BackToDirection),
            "start_over" => Some(Self::StartOver),
            _ => None,
        }
    }

    /// Serialize back into the button value bag embedded in views.
    #[must_use]
    pub fn to_button_value(&self) -> Value {
        let mut bag = Map::new();
        let _ = bag.insert("action".into(), json!(self.name()));
        match self {
            Self::SelectDirection { direction } | Self::RegenerateTopics { direction } => {
                let _ = bag.insert("direction".into(), json!(direction));
            }
            Self::SelectTopic { topic } | Self::RegenerateOutline { topic } => {
                let _ = bag.insert("topic".into(), json!(topic));
            }
            Self::ConfirmOutline { topic, outline } => {
                let _ = bag.insert("topic".into(), json!(topic));
                let _ = bag.insert("outline".into(), json!(outline));
            }
            Self::BackToDirection | Self::StartOver => {}
        }
        Value::Object(bag)
    }
}
