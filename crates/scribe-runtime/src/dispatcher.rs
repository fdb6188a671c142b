//! Callback dispatcher: immediate ack, deferred execution.
//!
//! The transport expects a reply well under its timeout, while generation
//! calls routinely take seconds. [`Dispatcher::handle_action`] therefore
//! decides synchronously (no external calls on that path) whether the action
//! will run, answers with a placeholder view, and executes the transition on
//! a spawned task bounded by a per-transition deadline.
//!
//! Failure isolation: every error in the deferred task is caught here and
//! turned into exactly one error view in the conversation; nothing
//! propagates far enough to crash the process, and the transition lock is
//! released on every exit path (the store guard releases on drop, which also
//! covers deadline cancellation).

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, instrument, warn};

use scribe_core::action::Action;
use scribe_core::errors::WorkflowError;
use scribe_core::ids::ConversationId;
use scribe_core::transport::Transport;
use scribe_core::views::View;

use crate::machine::{WorkflowMachine, is_legal};
use crate::store::SessionStore;
use crate::views;

/// Actions accepted for execution (counter, label: action).
const ACTIONS_TOTAL: &str = "workflow_actions_total";
/// Actions dropped at the ack path (counter, label: reason).
const ACTIONS_IGNORED_TOTAL: &str = "workflow_actions_ignored_total";
/// Deferred transitions that failed (counter, label: kind).
const TRANSITIONS_FAILED_TOTAL: &str = "workflow_transitions_failed_total";

/// Turns inbound action events into an immediate reply plus a deferred
/// transition.
pub struct Dispatcher {
    store: Arc<SessionStore>,
    machine: Arc<WorkflowMachine>,
    transport: Arc<dyn Transport>,
    deadline: Duration,
}

impl Dispatcher {
    /// Wire up the dispatcher.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        machine: Arc<WorkflowMachine>,
        transport: Arc<dyn Transport>,
        deadline: Duration,
    ) -> Self {
        Self {
            store,
            machine,
            transport,
            deadline,
        }
    }

    /// Handle one action event, returning the immediate view for the
    /// caller's response. Synchronous by design: the ack path must stay well
    /// under the transport's timeout, so it never touches an external call.
    #[instrument(skip(self, action), fields(conversation = %conversation, action = action.name()))]
    pub fn handle_action(&self, conversation: &ConversationId, action: Action) -> View {
        let session = self.store.get_or_create(conversation);

        if self.store.is_in_flight(conversation) {
            debug!("transition in flight, dropping action");
            counter!(ACTIONS_IGNORED_TOTAL, "reason" => "busy").increment(1);
            return views::ignored_view("上一步还在处理中，已忽略本次点击");
        }

        if !is_legal(session.state, &action) {
            info!(state = ?session.state, "illegal action, dropping");
            counter!(ACTIONS_IGNORED_TOTAL, "reason" => "illegal_transition").increment(1);
            return views::ignored_view("当前步骤无法执行该操作");
        }

        counter!(ACTIONS_TOTAL, "action" => action.name()).increment(1);
        self.spawn_deferred(conversation.clone(), action, session.version);
        views::loading_view("处理中，稍等...")
    }

    /// Reset the session and send the direction picker. Entry point for the
    /// "start writing" chat command.
    pub async fn start(&self, conversation: &ConversationId) -> Result<(), WorkflowError> {
        let view = self.machine.start(conversation).await?;
        let _ = self.transport.send_view(conversation, &view).await?;
        Ok(())
    }

    /// Deadline for one deferred transition.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run the transition off the caller's response path.
    fn spawn_deferred(&self, conversation: ConversationId, action: Action, version: u64) {
        let machine = Arc::clone(&self.machine);
        let transport = Arc::clone(&self.transport);
        let deadline = self.deadline;

        drop(tokio::spawn(async move {
            let outcome =
                tokio::time::timeout(deadline, machine.execute(&conversation, action, Some(version)))
                    .await;

            let error = match outcome {
                Ok(Ok(view)) => {
                    if let Err(e) = transport.send_view(&conversation, &view).await {
                        warn!(conversation = %conversation, error = %e, "failed to send result view");
                    }
                    return;
                }
                // Raced a concurrent transition or a duplicate click after
                // ack; dropped silently per the tolerance policy.
                Ok(Err(e @ (WorkflowError::Busy | WorkflowError::IllegalTransition { .. }))) => {
                    debug!(conversation = %conversation, error = %e, "transition dropped");
                    counter!(TRANSITIONS_FAILED_TOTAL, "kind" => e.kind()).increment(1);
                    return;
                }
                Ok(Err(e)) => e,
                // The execute future was cancelled by the deadline; its
                // guard dropped, force-releasing the transition lock.
                Err(_elapsed) => WorkflowError::Timeout(deadline.as_secs()),
            };

            warn!(conversation = %conversation, error = %error, "transition failed");
            counter!(TRANSITIONS_FAILED_TOTAL, "kind" => error.kind()).increment(1);
            let view = views::error_view(&error);
            if let Err(e) = transport.send_view(&conversation, &view).await {
                warn!(conversation = %conversation, error = %e, "failed to send error view");
            }
        }));
    }
}
