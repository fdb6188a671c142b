//! # scribe-llm
//!
//! Text-completion boundary for the Scribe workflow bot.
//!
//! - [`provider::CompletionService`] — the prompt-in/text-out trait every
//!   generation step runs through
//! - [`deepseek::DeepSeekProvider`] — chat-completions HTTP implementation
//! - [`generate::Generator`] — per-step prompt construction and response
//!   parsing for topics, outlines, and articles
//!
//! The adapter keeps no state of its own and never retries; retry policy
//! belongs to the user clicking the button again.

#![deny(unsafe_code)]

pub mod deepseek;
pub mod generate;
pub mod provider;

pub use deepseek::{DeepSeekConfig, DeepSeekProvider};
pub use generate::Generator;
pub use provider::{CompletionService, ProviderError};
