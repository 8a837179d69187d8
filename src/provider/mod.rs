//! Chat provider trait and the Gemini implementation.

pub mod gemini;
pub mod http;

pub use gemini::GeminiProvider;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::types::{FinishReason, GenerationSettings, ModelMessage, TextStreamDelta, Usage};

/// A request sent to a chat provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Full message list, oldest first, new user message last.
    pub messages: Vec<ModelMessage>,
    /// Sampling settings.
    pub settings: GenerationSettings,
}

/// Response from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    /// Generated text.
    pub text: String,
    /// Token usage.
    pub usage: Usage,
    /// Why generation finished.
    pub finish_reason: Option<FinishReason>,
}

/// A stateless chat-completion backend.
///
/// Every request carries the full message list; providers keep no
/// conversation state of their own.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate text (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Generate text (streaming).
    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>>;
}

/// Create the Gemini provider described by `config`.
pub fn create_provider(config: &ChatConfig) -> Result<Box<dyn ChatProvider>> {
    let api_key = config
        .api_key()
        .ok_or_else(|| ChatError::Configuration("GOOGLE_API_KEY not found".into()))?;
    Ok(Box::new(GeminiProvider::new(
        config.model,
        api_key.to_string(),
        config.base_url.clone(),
        config.retry_policy(),
        config.request_timeout(),
    )?))
}
