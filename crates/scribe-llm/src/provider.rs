//! Completion-service trait and provider errors.

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes of an upstream completion call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP request itself failed.
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status or an error body.
    #[error("completion API error ({status}): {message}")]
    Api {
        /// HTTP status code, 0 when the error came in a 200 body.
        status: u16,
        /// Upstream error message.
        message: String,
    },

    /// The call succeeded but produced no usable text.
    #[error("completion returned no usable text")]
    Empty,
}

/// Result alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// External text-completion service: prompt in, text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one completion, bounded by `max_tokens`.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String>;
}
