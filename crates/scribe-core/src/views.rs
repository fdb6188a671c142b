//! Transport-agnostic view model.
//!
//! A [`View`] is the structured payload rendered for a session state: an
//! optional colored header, markdown text blocks, and rows of labeled action
//! buttons. The transport layer owns the conversion into its concrete card
//! format; nothing here is Lark-specific beyond the general shape.

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Header accent color, mapped to the transport's card template colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    /// Informational (step prompts).
    Blue,
    /// Success (topic list, done).
    Green,
    /// Pending confirmation (outline).
    Yellow,
    /// Failure.
    Red,
}

/// Visual weight of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    /// Emphasized, the expected next step.
    Primary,
    /// Neutral.
    Default,
    /// Destructive or backward.
    Danger,
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonBehavior {
    /// Post an [`Action`] back through the callback ingress.
    Act(Action),
    /// Open an external link (the durable document link on the done view).
    Open {
        /// Absolute URL.
        url: String,
    },
}

/// One labeled action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Visual weight.
    pub kind: ButtonKind,
    /// Click behavior.
    pub behavior: ButtonBehavior,
}

impl Button {
    /// Button that posts an action back.
    #[must_use]
    pub fn act(label: impl Into<String>, kind: ButtonKind, action: Action) -> Self {
        Self {
            label: label.into(),
            kind,
            behavior: ButtonBehavior::Act(action),
        }
    }

    /// Button that opens a link.
    #[must_use]
    pub fn open(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ButtonKind::Primary,
            behavior: ButtonBehavior::Open { url: url.into() },
        }
    }
}

/// One element of a view body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Markdown text block.
    Text(String),
    /// One row of buttons.
    Buttons(Vec<Button>),
}

/// Structured message/card payload rendered for a session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct View {
    /// Header title, if the view has one.
    pub title: Option<String>,
    /// Header accent color.
    pub accent: Option<Accent>,
    /// Body elements in render order.
    pub elements: Vec<Element>,
}

impl View {
    /// View with a colored header.
    #[must_use]
    pub fn titled(title: impl Into<String>, accent: Accent) -> Self {
        Self {
            title: Some(title.into()),
            accent: Some(accent),
            elements: Vec::new(),
        }
    }

    /// Headerless view with a single text block.
    #[must_use]
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            title: None,
            accent: None,
            elements: vec![Element::Text(text.into())],
        }
    }

    /// Append a text block.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.elements.push(Element::Text(text.into()));
        self
    }

    /// Append a button row.
    #[must_use]
    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.elements.push(Element::Buttons(buttons));
        self
    }

    /// All actions reachable from this view's buttons. Used by tests to
    /// assert which transitions a rendered state offers.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.elements.iter().flat_map(|e| match e {
            Element::Buttons(buttons) => buttons.as_slice(),
            Element::Text(_) => &[],
        })
        .filter_map(|b| match &b.behavior {
            ButtonBehavior::Act(action) => Some(action),
            ButtonBehavior::Open { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_in_order() {
        let view = View::titled("标题", Accent::Blue)
            .with_text("正文")
            .with_buttons(vec![Button::act("开始", ButtonKind::Primary, Action::StartOver)]);
        assert_eq!(view.elements.len(), 2);
        assert!(matches!(&view.elements[0], Element::Text(t) if t == "正文"));
    }

    #[test]
    fn actions_iterates_only_act_buttons() {
        let view = View::default()
            .with_buttons(vec![
                Button::act("a", ButtonKind::Default, Action::StartOver),
                Button::open("doc", "https://doc/abc"),
            ]);
        let actions: Vec<_> = view.actions().collect();
        assert_eq!(actions, vec![&Action::StartOver]);
    }

    #[test]
    fn text_only_has_no_header() {
        let view = View::text_only("处理中");
        assert!(view.title.is_none());
        assert_eq!(view.elements.len(), 1);
    }
}
