//! LLM transport abstraction
//!
//! The orchestration core only needs to send a list of role-tagged
//! messages to a named model and get role-tagged completions back.

mod error;
mod models;
mod openai;
mod types;

#[cfg(test)]
mod proptests;

pub use error::{LlmError, LlmErrorKind};
pub use models::{all_models, find_by_name, find_by_prefix, ModelSpec};
pub use openai::OpenAiTransport;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for model transports
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one request and wait for the full completion
    async fn send(&self, request: &ConversationRequest) -> Result<ChatCompletion, LlmError>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send(&self, request: &ConversationRequest) -> Result<ChatCompletion, LlmError> {
        (**self).send(request).await
    }
}

/// Logging wrapper for transports
pub struct LoggingTransport {
    inner: Arc<dyn ChatTransport>,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn ChatTransport>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ChatTransport for LoggingTransport {
    async fn send(&self, request: &ConversationRequest) -> Result<ChatCompletion, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(completion) => {
                let usage = completion.usage.unwrap_or_default();
                tracing::info!(
                    model = %request.model_endpoint_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %request.model_endpoint_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
            }
        }

        result
    }
}
