//! Completion client
//!
//! Turns a transcript into one request against a chat-completion provider
//! and the provider's answer back into plain text or a typed failure.

mod config;
mod error;
mod openai;
mod types;

#[cfg(test)]
pub mod testing;

pub use config::LlmConfig;
pub use error::CompletionError;
pub use openai::{OpenAIService, WireProfile};
pub use types::{Creativity, GenerationParameters};

use crate::transcript::Transcript;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Request the next assistant turn for `transcript`.
    ///
    /// The transcript must open with the system turn and end with the user
    /// turn being answered. Exactly one request is issued; nothing is retried.
    async fn complete(
        &self,
        transcript: &Transcript,
        params: &GenerationParameters,
    ) -> Result<String, CompletionError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: LlmService + ?Sized> LlmService for Arc<T> {
    async fn complete(
        &self,
        transcript: &Transcript,
        params: &GenerationParameters,
    ) -> Result<String, CompletionError> {
        (**self).complete(transcript, params).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Create the configured provider, wrapped with request logging
pub fn connect(config: &LlmConfig) -> Result<Arc<dyn LlmService>, CompletionError> {
    let service = OpenAIService::new(config)?;
    tracing::debug!(
        model = %config.model,
        profile = %config.profile,
        endpoint = %service.endpoint(),
        "Completion client ready"
    );
    Ok(Arc::new(LoggingService::new(Arc::new(service))))
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(
        &self,
        transcript: &Transcript,
        params: &GenerationParameters,
    ) -> Result<String, CompletionError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(transcript, params).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    model = %self.model_id,
                    persona = %params.persona,
                    duration_ms = %duration.as_millis(),
                    turns = transcript.len(),
                    reply_chars = text.chars().count(),
                    "Completion succeeded"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    persona = %params.persona,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind().as_str(),
                    status = ?e.status(),
                    error = %e,
                    "Completion failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
