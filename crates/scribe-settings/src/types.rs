//! Settings schema.
//!
//! Every field has a compiled default so a missing or partial settings file
//! still yields a runnable configuration (secrets excepted: the provider API
//! key is always read from the environment, never from the file).

use serde::{Deserialize, Serialize};

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// HTTP shell settings.
    pub server: ServerSettings,
    /// Completion-provider settings.
    pub provider: ProviderSettings,
    /// Workflow-engine settings.
    pub workflow: WorkflowSettings,
}

/// HTTP shell settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    /// Socket address to bind.
    pub bind: String,
    /// Optional webhook verification token; when set, event-subscription
    /// challenges must carry it.
    pub verification_token: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            verification_token: None,
        }
    }
}

/// Completion-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Chat model name.
    pub model: String,
    /// Endpoint override; `None` uses the provider default.
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            base_url: None,
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
        }
    }
}

/// Workflow-engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowSettings {
    /// Deadline for one deferred transition, in seconds. On expiry the
    /// transition is aborted, the session lock force-released, and a timeout
    /// error view emitted.
    pub transition_deadline_secs: u64,
    /// Maximum characters of article preview shown on the done view.
    pub preview_max_chars: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            transition_deadline_secs: 120,
            preview_max_chars: 150,
        }
    }
}
