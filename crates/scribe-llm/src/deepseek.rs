//! `DeepSeek` completion provider implementing [`CompletionService`].
//!
//! Single non-streaming round trip against the OpenAI-compatible
//! chat-completions endpoint with Bearer auth. Error bodies may arrive with
//! a 200 status (`{"error": {...}}`), so both paths are checked.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, error, instrument};

use crate::provider::{CompletionService, ProviderError, ProviderResult};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// `DeepSeek` provider configuration.
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    /// Model name sent in the request body.
    pub model: String,
    /// Bearer token.
    pub api_key: String,
    /// Endpoint override, mainly for tests.
    pub base_url: Option<String>,
}

impl DeepSeekConfig {
    /// Config with the default model and endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            base_url: None,
        }
    }
}

/// `DeepSeek` completion provider.
pub struct DeepSeekProvider {
    config: DeepSeekConfig,
    client: reqwest::Client,
}

impl DeepSeekProvider {
    /// Create a provider with its own HTTP client.
    #[must_use]
    pub fn new(config: DeepSeekConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a provider sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(config: DeepSeekConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build HTTP headers: JSON content type plus Bearer auth.
    fn build_headers(&self) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = format!("Bearer {}", self.config.api_key);
        let _ = headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| ProviderError::Api {
                status: 0,
                message: format!("invalid API key header: {e}"),
            })?,
        );
        Ok(headers)
    }

    /// Build the single-message request body.
    fn build_request(&self, prompt: &str, max_tokens: u32) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        })
    }

    /// Pull the completion text out of a response body, surfacing embedded
    /// error objects.
    fn extract_text(body: &Value) -> ProviderResult<String> {
        if let Some(err) = body.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown upstream error")
                .to_string();
            return Err(ProviderError::Api { status: 0, message });
        }
        let text = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl CompletionService for DeepSeekProvider {
    #[instrument(skip_all, fields(model = %self.config.model, max_tokens))]
    async fn complete(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String> {
        let base_url = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = format!("{base_url}/v1/chat/completions");
        let headers = self.build_headers()?;
        let body = self.build_request(prompt, max_tokens);

        debug!(prompt_len = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(body_text);
            error!(status = status.as_u16(), "completion API error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: Value = response.json().await?;
        Self::extract_text(&parsed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
