//! Workflow state machine.
//!
//! One [`WorkflowMachine::execute`] call runs one transition end to end:
//! acquire the session's transition lock, run the transition's generation
//! step(s), commit the mutation, and return the next view. Any failure
//! before the commit aborts the transition — the lock is released through
//! the guard on every exit path and the committed session state is exactly
//! what it was before.
//!
//! The terminal `confirm_outline` transition has two sequential external
//! calls: generate the article, then persist it. If persistence fails after
//! generation succeeded, the transition aborts and the article text is
//! discarded; retrying the action regenerates it.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use scribe_core::action::Action;
use scribe_core::errors::WorkflowError;
use scribe_core::ids::ConversationId;
use scribe_core::session::WorkflowState;
use scribe_core::transport::{DocumentSink, Transport};
use scribe_core::views::View;
use scribe_llm::Generator;

use crate::store::SessionStore;
use crate::views;

/// Whether `action` is a legal transition out of `state`.
///
/// This is the transition table; anything not listed is an illegal
/// transition, tolerated as a no-op upstream.
#[must_use]
pub fn is_legal(state: WorkflowState, action: &Action) -> bool {
    match action {
        Action::StartOver => true,
        Action::SelectDirection { .. } => state == WorkflowState::Direction,
        Action::RegenerateTopics { .. } | Action::SelectTopic { .. } => {
            state == WorkflowState::Topic
        }
        Action::RegenerateOutline { .. }
        | Action::ConfirmOutline { .. }
        | Action::BackToDirection => state == WorkflowState::Outline,
    }
}

/// Executes workflow transitions against the session store.
pub struct WorkflowMachine {
    store: Arc<SessionStore>,
    generator: Generator,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn DocumentSink>,
    preview_max_chars: usize,
}

impl WorkflowMachine {
    /// Wire up the machine with its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        generator: Generator,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn DocumentSink>,
        preview_max_chars: usize,
    ) -> Self {
        Self {
            store,
            generator,
            transport,
            sink,
            preview_max_chars,
        }
    }

    /// Run one transition. `expected_version` is the session version the
    /// action was acknowledged against; a mismatch means the action is stale
    /// and is dropped as [`WorkflowError::Busy`].
    ///
    /// Returns the view for the session's new state; the caller emits it.
    #[instrument(skip(self, action), fields(conversation = %conversation, action = action.name()))]
    pub async fn execute(
        &self,
        conversation: &ConversationId,
        action: Action,
        expected_version: Option<u64>,
    ) -> Result<View, WorkflowError> {
        let guard = self
            .store
            .try_begin_transition(conversation, expected_version)?;

        // Re-check against the locked snapshot; the ack-time check raced.
        let state = guard.snapshot().state;
        if !is_legal(state, &action) {
            let name = action.name();
            guard.abort();
            return Err(WorkflowError::IllegalTransition {
                state,
                action: name,
            });
        }

        match action {
            Action::SelectDirection { direction } => {
                self.progress(conversation, &format!("正在为「{direction}」生成选题..."))
                    .await;
                let topics = self.generator.generate_topics(&direction).await?;
                let committed =
                    guard.commit(|s| s.enter_topic(direction.clone(), topics.clone()));
                debug!(version = committed.version, "entered Topic");
                Ok(views::topic_choice_view(&direction, &topics))
            }

            Action::RegenerateTopics { direction } => {
                self.progress(conversation, &format!("重新生成「{direction}」选题..."))
                    .await;
                let topics = self.generator.generate_topics(&direction).await?;
                let _ = guard.commit(|s| s.enter_topic(direction.clone(), topics.clone()));
                Ok(views::topic_choice_view(&direction, &topics))
            }

            Action::SelectTopic { topic } => {
                self.progress(conversation, &format!("正在为「{topic}」生成大纲..."))
                    .await;
                let outline = self.generator.generate_outline(&topic).await?;
                let _ = guard.commit(|s| s.enter_outline(topic.clone(), outline.clone()));
                Ok(views::outline_view(&topic, &outline))
            }

            Action::RegenerateOutline { topic } => {
                self.progress(conversation, &format!("重新生成「{topic}」大纲..."))
                    .await;
                let outline = self.generator.generate_outline(&topic).await?;
                let _ = guard.commit(|s| s.replace_outline(outline.clone()));
                Ok(views::outline_view(&topic, &outline))
            }

            Action::ConfirmOutline { topic, outline } => {
                // The session is observably in `Writing` for the duration of
                // this block; the committed state jumps Outline → Done so an
                // abort leaves it exactly at Outline.
                self.progress(
                    conversation,
                    &format!("正在写作「{topic}」，大约需要 30 秒..."),
                )
                .await;
                let article = self.generator.generate_article(&topic, &outline).await?;
                let title = format!("{topic} · {}", chrono::Local::now().format("%Y/%-m/%-d"));
                let doc_url = self.sink.persist_document(&article, &title).await?;
                let preview = views::preview_of(&article, self.preview_max_chars);
                let committed = guard.commit(scribe_core::session::Session::finish);
                info!(version = committed.version, %doc_url, "article persisted, workflow done");
                Ok(views::done_view(&topic, &doc_url, &preview))
            }

            Action::BackToDirection | Action::StartOver => {
                let _ = guard.commit(scribe_core::session::Session::reset);
                Ok(views::direction_view())
            }
        }
    }

    /// Reset the session and return the direction picker. Used by the
    /// "start writing" chat command; shares the commit path with
    /// `start_over`.
    #[instrument(skip(self), fields(conversation = %conversation))]
    pub async fn start(&self, conversation: &ConversationId) -> Result<View, WorkflowError> {
        let guard = self.store.try_begin_transition(conversation, None)?;
        let _ = guard.commit(scribe_core::session::Session::reset);
        Ok(views::direction_view())
    }

    /// Best-effort mid-transition progress message. A failed send is logged
    /// and ignored — it must not abort the transition.
    async fn progress(&self, conversation: &ConversationId, message: &str) {
        let view = views::loading_view(message);
        if let Err(e) = self.transport.send_view(conversation, &view).await {
            tracing::warn!(error = %e, "failed to send progress view");
        }
    }
}
