//! # scribe-settings
//!
//! Configuration for the Scribe workflow bot, loaded from three layers
//! (in priority order):
//!
//! 1. **Compiled defaults** — [`Settings::default()`]
//! 2. **JSON file** — deep-merged over defaults
//! 3. **Environment variables** — `SCRIBE_*` overrides (highest priority)
//!
//! There is no global singleton: `main` loads a [`Settings`] once and passes
//! it down, and tests build their own instances.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{deep_merge, load_settings};
pub use types::{ProviderSettings, ServerSettings, Settings, WorkflowSettings};
