//! Lark/Feishu open-platform client.
//!
//! Implements the core's [`Transport`] (interactive-card messages, create +
//! in-place patch) and [`DocumentSink`] (docx create + paragraph append)
//! against the tenant-token HTTP API. The [`card_json`] converter is also
//! used by the webhook handler: a card-callback HTTP response body *is* the
//! replacement card.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use scribe_core::errors::{PersistenceError, TransportError};
use scribe_core::ids::{ConversationId, MessageRef};
use scribe_core::transport::{DocumentSink, Transport};
use scribe_core::views::{Accent, Button, ButtonBehavior, ButtonKind, Element, View};

/// Default open-platform endpoint.
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn";

/// Refresh the tenant token this long before its reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lark app credentials and endpoints.
#[derive(Debug, Clone)]
pub struct LarkConfig {
    /// App ID from the open platform.
    pub app_id: String,
    /// App secret from the open platform.
    pub app_secret: String,
    /// API endpoint override, mainly for tests.
    pub base_url: Option<String>,
    /// Tenant domain used to synthesize document links, e.g.
    /// `https://example.feishu.cn`.
    pub doc_domain: String,
}

impl LarkConfig {
    /// Read credentials from `LARK_APP_ID` / `LARK_APP_SECRET` /
    /// `LARK_DOC_DOMAIN`.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            app_id: std::env::var("LARK_APP_ID")
                .map_err(|_| anyhow::anyhow!("LARK_APP_ID is not set"))?,
            app_secret: std::env::var("LARK_APP_SECRET")
                .map_err(|_| anyhow::anyhow!("LARK_APP_SECRET is not set"))?,
            base_url: None,
            doc_domain: std::env::var("LARK_DOC_DOMAIN")
                .unwrap_or_else(|_| "https://feishu.cn".to_string()),
        })
    }
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Lark HTTP client.
pub struct LarkClient {
    config: LarkConfig,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl LarkClient {
    /// Create a client with its own HTTP client.
    #[must_use]
    pub fn new(config: LarkConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Get a tenant access token, refreshing the cached one when close to
    /// expiry.
    async fn tenant_token(&self) -> Result<String, TransportError> {
        {
            let cached = self.token.lock();
            if let Some(t) = cached.as_ref() {
                if t.expires_at > Instant::now() {
                    return Ok(t.token.clone());
                }
            }
        }

        let url = format!(
            "{}/open-apis/auth/v3/tenant_access_token/internal",
            self.base_url()
        );
        let body = json!({
            "app_id": self.config.app_id,
            "app_secret": self.config.app_secret,
        });
        let response: Value = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        check_code(&response)?;
        let token = response
            .get("tenant_access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::Http("no tenant_access_token in reply".into()))?
            .to_string();
        let expire_secs = response.get("expire").and_then(Value::as_u64).unwrap_or(0);

        let expires_at = Instant::now() + Duration::from_secs(expire_secs)
            - TOKEN_EXPIRY_MARGIN.min(Duration::from_secs(expire_secs));
        *self.token.lock() = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        debug!(expire_secs, "tenant token refreshed");
        Ok(token)
    }

    /// POST a JSON body with Bearer auth and return the parsed reply after
    /// checking its business code.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        let token = self.tenant_token().await?;
        let response: Value = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        check_code(&response)?;
        Ok(response)
    }
}

/// Lark replies carry a business `code` even on HTTP 200; nonzero is an
/// error.
fn check_code(response: &Value) -> Result<(), TransportError> {
    let code = response.get("code").and_then(Value::as_i64).unwrap_or(0);
    if code != 0 {
        let message = response
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        return Err(TransportError::Api { code, message });
    }
    Ok(())
}

#[async_trait]
impl Transport for LarkClient {
    #[instrument(skip_all, fields(conversation = %conversation))]
    async fn send_view(
        &self,
        conversation: &ConversationId,
        view: &View,
    ) -> Result<MessageRef, TransportError> {
        let url = format!(
            "{}/open-apis/im/v1/messages?receive_id_type=chat_id",
            self.base_url()
        );
        let body = json!({
            "receive_id": conversation.as_str(),
            "msg_type": "interactive",
            "content": card_json(view).to_string(),
        });
        let response = self.post_json(&url, &body).await?;
        let message_id = response
            .pointer("/data/message_id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(MessageRef::new(message_id))
    }

    #[instrument(skip_all, fields(message = %message))]
    async fn update_view(&self, message: &MessageRef, view: &View) -> Result<(), TransportError> {
        let url = format!(
            "{}/open-apis/im/v1/messages/{}",
            self.base_url(),
            message.as_str()
        );
        let token = self.tenant_token().await?;
        let body = json!({ "content": card_json(view).to_string() });
        let response: Value = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        check_code(&response)
    }
}

#[async_trait]
impl DocumentSink for LarkClient {
    #[instrument(skip_all, fields(title = %title))]
    async fn persist_document(
        &self,
        text: &str,
        title: &str,
    ) -> Result<String, PersistenceError> {
        let to_persistence = |e: TransportError| PersistenceError::new(e.to_string());

        // Create the document shell.
        let url = format!("{}/open-apis/docx/v1/documents", self.base_url());
        let response = self
            .post_json(&url, &json!({ "title": title }))
            .await
            .map_err(to_persistence)?;
        let doc_id = response
            .pointer("/data/document/document_id")
            .and_then(Value::as_str)
            .ok_or_else(|| PersistenceError::new("no document_id in create reply"))?
            .to_string();

        // Append one text block per paragraph.
        let children: Vec<Value> = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                json!({
                    "block_type": 2,
                    "text": {
                        "elements": [{ "text_run": { "content": p.trim() } }],
                        "style": {},
                    },
                })
            })
            .collect();
        let url = format!(
            "{}/open-apis/docx/v1/documents/{doc_id}/blocks/{doc_id}/children?document_revision_id=-1",
            self.base_url()
        );
        let _ = self
            .post_json(&url, &json!({ "children": children, "index": 0 }))
            .await
            .map_err(to_persistence)?;

        Ok(format!("{}/docx/{doc_id}", self.config.doc_domain))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View → card conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a transport-agnostic [`View`] into Lark interactive-card JSON.
#[must_use]
pub fn card_json(view: &View) -> Value {
    let mut card = json!({
        "config": { "wide_screen_mode": true },
        "elements": view.elements.iter().map(element_json).collect::<Vec<_>>(),
    });
    if let Some(title) = &view.title {
        card["header"] = json!({
            "title": { "tag": "plain_text", "content": title },
            "template": accent_template(view.accent.unwrap_or(Accent::Blue)),
        });
    }
    card
}

fn accent_template(accent: Accent) -> &'static str {
    match accent {
        Accent::Blue => "blue",
        Accent::Green => "green",
        Accent::Yellow => "yellow",
        Accent::Red => "red",
    }
}

fn element_json(element: &Element) -> Value {
    match element {
        Element::Text(content) => json!({
            "tag": "div",
            "text": { "tag": "lark_md", "content": content },
        }),
        Element::Buttons(buttons) => json!({
            "tag": "action",
            "actions": buttons.iter().map(button_json).collect::<Vec<_>>(),
        }),
    }
}

fn button_json(button: &Button) -> Value {
    let kind = match button.kind {
        ButtonKind::Primary => "primary",
        ButtonKind::Default => "default",
        ButtonKind::Danger => "danger",
    };
    let mut value = json!({
        "tag": "button",
        "text": { "tag": "plain_text", "content": &button.label },
        "type": kind,
    });
    match &button.behavior {
        ButtonBehavior::Act(action) => value["value"] = action.to_button_value(),
        ButtonBehavior::Open { url } => {
            value["url"] = json!(url);
            value["value"] = json!({});
        }
    }
    value
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_runtime::views::{direction_view, done_view, loading_view};
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LarkClient {
        LarkClient::new(LarkConfig {
            app_id: "cli_test".into(),
            app_secret: "secret".into(),
            base_url: Some(server.uri()),
            doc_domain: "https://example.feishu.cn".into(),
        })
    }

    async fn mount_token(server: &MockServer, expect: u64) {
        Mock::given(method("POST"))
            .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
            .and(body_partial_json(json!({"app_id": "cli_test"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "tenant_access_token": "t-xyz", "expire": 7200
            })))
            .expect(expect)
            .mount(server)
            .await;
    }

    // ── Card conversion ─────────────────────────────────────────────────

    #[test]
    fn card_json_maps_header_and_buttons() {
        let card = card_json(&direction_view());
        assert_eq!(card["header"]["template"], "blue");
        assert_eq!(card["config"]["wide_screen_mode"], true);
        let actions = &card["elements"][0]["actions"];
        assert_eq!(actions.as_array().unwrap().len(), 4);
        assert_eq!(actions[0]["value"]["action"], "select_direction");
        assert_eq!(actions[0]["type"], "primary");
    }

    #[test]
    fn card_json_loading_has_no_header() {
        let card = card_json(&loading_view("处理中"));
        assert!(card.get("header").is_none());
        assert_eq!(card["elements"][0]["tag"], "div");
    }

    #[test]
    fn card_json_link_button_has_url_and_empty_value() {
        let card = card_json(&done_view("t", "https://doc/abc", "预览"));
        let button = &card["elements"][1]["actions"][0];
        assert_eq!(button["url"], "https://doc/abc");
        assert_eq!(button["value"], json!({}));
    }

    // ── Transport ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn send_view_posts_interactive_message() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/open-apis/im/v1/messages"))
            .and(body_partial_json(json!({
                "receive_id": "oc_1",
                "msg_type": "interactive",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "data": { "message_id": "om_42" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let msg = client
            .send_view(&ConversationId::new("oc_1"), &loading_view("处理中"))
            .await
            .unwrap();
        assert_eq!(msg.as_str(), "om_42");
    }

    #[tokio::test]
    async fn token_is_cached_between_calls() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await; // exactly one token fetch
        Mock::given(method("POST"))
            .and(path("/open-apis/im/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "data": { "message_id": "om_1" }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let conversation = ConversationId::new("oc_1");
        let _ = client
            .send_view(&conversation, &loading_view("一"))
            .await
            .unwrap();
        let _ = client
            .send_view(&conversation, &loading_view("二"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn nonzero_business_code_is_api_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/open-apis/im/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 230002, "msg": "bot not in chat"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .send_view(&ConversationId::new("oc_1"), &loading_view("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Api { code: 230002, .. }));
    }

    // ── Document sink ───────────────────────────────────────────────────

    #[tokio::test]
    async fn persist_document_creates_doc_and_appends_paragraphs() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/open-apis/docx/v1/documents"))
            .and(body_partial_json(json!({"title": "选题 · 2026/8/24"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "data": { "document": { "document_id": "doccn123" } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(
                r"^/open-apis/docx/v1/documents/doccn123/blocks/doccn123/children$",
            ))
            .and(body_partial_json(json!({"index": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let link = client
            .persist_document("第一段\n\n第二段", "选题 · 2026/8/24")
            .await
            .unwrap();
        assert_eq!(link, "https://example.feishu.cn/docx/doccn123");
    }

    #[tokio::test]
    async fn persist_document_failure_is_persistence_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/open-apis/docx/v1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 99991, "msg": "permission denied"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.persist_document("正文", "标题").await.unwrap_err();
        assert!(err.to_string().contains("permission denied"));
    }
}
