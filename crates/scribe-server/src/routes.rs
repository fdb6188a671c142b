//! Axum webhook ingress.
//!
//! Two inbound surfaces from the messaging platform:
//!
//! - `POST /webhook/card` — interactive-card button callbacks. The HTTP
//!   response body is itself a card: the platform replaces the clicked card
//!   with whatever we answer, which is how the dispatcher's immediate
//!   placeholder view reaches the user.
//! - `POST /webhook/event` — message events (chat text commands). Always
//!   acked immediately; command handling runs on a spawned task.
//!
//! Both surfaces answer the platform's `url_verification` handshake. All
//! envelope parsing lives here; the core only sees typed actions.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use scribe_core::action::Action;
use scribe_core::ids::ConversationId;
use scribe_core::transport::Transport;
use scribe_core::views::View;
use scribe_runtime::dispatcher::Dispatcher;

use crate::commands::{self, Command};
use crate::lark::card_json;
use crate::metrics;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Workflow dispatcher (ack + deferred execution).
    pub dispatcher: Arc<Dispatcher>,
    /// Outbound transport, used directly for command replies.
    pub transport: Arc<dyn Transport>,
    /// Expected event-webhook verification token, if configured.
    pub verification_token: Option<String>,
    /// Prometheus render handle.
    pub prometheus: PrometheusHandle,
}

/// Build the server router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/card", post(card_callback))
        .route("/webhook/event", post(event_callback))
        .route("/healthz", get(healthz))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<AppState>) -> String {
    metrics::render(&state.prometheus)
}

/// Card button callback. Must answer fast; the reply body replaces the card.
#[instrument(skip_all)]
async fn card_callback(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    if body.get("type").and_then(Value::as_str) == Some("url_verification") {
        return Json(json!({ "challenge": body.get("challenge").cloned().unwrap_or_default() }));
    }

    let Some(chat_id) = body.get("open_chat_id").and_then(Value::as_str) else {
        debug!("card callback without open_chat_id, ignoring");
        return Json(json!({}));
    };
    let Some(action) = body
        .pointer("/action/value")
        .and_then(Action::from_button_value)
    else {
        debug!(chat_id, "card callback with unknown action value, ignoring");
        return Json(json!({}));
    };

    let conversation = ConversationId::new(chat_id);
    let view = state.dispatcher.handle_action(&conversation, action);
    Json(card_json(&view))
}

/// Message event callback. Acks unconditionally; the command runs deferred.
#[instrument(skip_all)]
async fn event_callback(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    if body.get("type").and_then(Value::as_str) == Some("url_verification") {
        if let Some(expected) = &state.verification_token {
            if body.get("token").and_then(Value::as_str) != Some(expected.as_str()) {
                warn!("url_verification with wrong token");
                return (StatusCode::FORBIDDEN, "token mismatch").into_response();
            }
        }
        return Json(json!({ "challenge": body.get("challenge").cloned().unwrap_or_default() }))
            .into_response();
    }

    drop(tokio::spawn(handle_event(state, body)));
    Json(json!({ "code": 0 })).into_response()
}

/// Process one message event off the ack path.
async fn handle_event(state: AppState, body: Value) {
    if body.get("schema").and_then(Value::as_str) != Some("2.0") {
        return;
    }
    if body.pointer("/header/event_type").and_then(Value::as_str)
        != Some("im.message.receive_v1")
    {
        return;
    }
    let message = &body["event"]["message"];
    if message.get("message_type").and_then(Value::as_str) != Some("text") {
        return;
    }
    let Some(chat_id) = message.get("chat_id").and_then(Value::as_str) else {
        return;
    };
    // The text payload is itself JSON: {"text": "..."}.
    let text = message
        .get("content")
        .and_then(Value::as_str)
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|content| {
            content
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();

    let Some(command) = commands::parse(&text) else {
        debug!(chat_id, "message is not a command, ignoring");
        return;
    };
    let conversation = ConversationId::new(chat_id);

    match command {
        Command::StartWriting => {
            info!(conversation = %conversation, "starting workflow from chat command");
            if let Err(e) = state.dispatcher.start(&conversation).await {
                warn!(conversation = %conversation, error = %e, "failed to start workflow");
            }
        }
        Command::Help => {
            let view = View::text_only(commands::HELP_TEXT);
            if let Err(e) = state.transport.send_view(&conversation, &view).await {
                warn!(conversation = %conversation, error = %e, "failed to send help");
            }
        }
    }
}
