//! Settings loading: file layer deep-merged over defaults, then env
//! overrides.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::SettingsError;
use crate::types::Settings;

/// Deep-merge `overlay` into `base`. Objects merge recursively; everything
/// else (including arrays) is replaced wholesale.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        let _ = base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, _) => *base_slot = overlay.clone(),
    }
}

/// Load settings: compiled defaults, optionally deep-merged with a JSON
/// file, then `SCRIBE_*` env overrides applied on top.
///
/// A missing file is fine (defaults apply); an unreadable or malformed file
/// is an error — silently ignoring a broken config hides misconfiguration.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut merged = serde_json::to_value(Settings::default())?;

    if let Some(path) = path {
        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let file_value: Value = serde_json::from_str(&raw)?;
            deep_merge(&mut merged, &file_value);
            debug!(path = %path.display(), "settings file merged");
        } else {
            debug!(path = %path.display(), "no settings file, using defaults");
        }
    }

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Apply `SCRIBE_*` environment overrides, the highest-priority layer.
fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(bind) = std::env::var("SCRIBE_BIND") {
        settings.server.bind = bind;
    }
    if let Ok(token) = std::env::var("SCRIBE_VERIFICATION_TOKEN") {
        settings.server.verification_token = Some(token);
    }
    if let Ok(model) = std::env::var("SCRIBE_PROVIDER_MODEL") {
        settings.provider.model = model;
    }
    if let Ok(base_url) = std::env::var("SCRIBE_PROVIDER_BASE_URL") {
        settings.provider.base_url = Some(base_url);
    }
    if let Ok(secs) = std::env::var("SCRIBE_TRANSITION_DEADLINE_SECS") {
        if let Ok(parsed) = secs.parse() {
            settings.workflow.transition_deadline_secs = parsed;
        }
    }
}
