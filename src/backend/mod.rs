//! Text-completion backend abstraction.
//!
//! The analysis pipeline only talks to a [`CompletionBackend`]; the
//! Ollama HTTP client is the production implementation.

mod ollama;

pub use ollama::{OllamaBackend, OllamaOptions};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while talking to the inference service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service could not be reached at all.
    #[error("cannot connect to backend at {url}: {message}")]
    Unavailable { url: String, message: String },

    /// The service answered with a non-success status.
    #[error("backend API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode backend response: {0}")]
    Decode(String),

    /// Any other transport failure.
    #[error("backend request failed: {0}")]
    Transport(String),
}

/// A single-consumer text-completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Names of the models the service can run.
    async fn list_models(&self) -> Result<Vec<String>, BackendError>;

    /// Run one completion and return the raw text.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError>;
}
