//! The conversation agent.

use futures::StreamExt;
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::error::Result;
use crate::provider::{self, ChatProvider, ProviderRequest, ProviderResponse};
use crate::types::*;

use super::history::History;

/// Wraps a stateless chat provider and owns the turn history.
///
/// The remote API keeps no state between requests, so every call replays the
/// whole history. A system prompt is only injected while the history is
/// empty and is never stored.
pub struct ConversationAgent {
    provider: Box<dyn ChatProvider>,
    settings: GenerationSettings,
    history: History,
}

impl ConversationAgent {
    pub fn new(provider: Box<dyn ChatProvider>) -> Self {
        Self {
            provider,
            settings: GenerationSettings::default(),
            history: History::new(),
        }
    }

    /// Build an agent for the configured Gemini model.
    ///
    /// Fails with a configuration error when no API key is available.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let provider = provider::create_provider(config)?;
        Ok(Self::new(provider).with_settings(config.generation_settings()))
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn history(&self) -> &[Turn] {
        self.history.turns()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Assemble the payload for the next call: optional system instruction
    /// (only on an empty history), every stored turn, then `message`.
    pub fn build_messages(&self, message: &str, system_prompt: Option<&str>) -> Vec<ModelMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if self.history.is_empty() {
            if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
                messages.push(ModelMessage::system(prompt));
            }
        }
        messages.extend(self.history.to_messages());
        messages.push(ModelMessage::user(message));
        messages
    }

    /// Send one user turn and wait for the full answer.
    ///
    /// Never fails: a remote error comes back as an `"Error: ..."` reply with
    /// no usage, and the history is left as it was.
    pub async fn send(&mut self, message: &str, system_prompt: Option<&str>) -> Reply {
        let request = self.request_for(message, system_prompt);
        let result = self.provider.generate_text(&request).await;
        self.finish(message, result)
    }

    /// Like [`send`](Self::send) but streams text chunks to `on_delta` as they
    /// arrive. History is only updated once the stream completes.
    pub async fn send_streaming<F>(
        &mut self,
        message: &str,
        system_prompt: Option<&str>,
        on_delta: F,
    ) -> Reply
    where
        F: FnMut(&str) + Send,
    {
        let request = self.request_for(message, system_prompt);
        let result = self.collect_stream(&request, on_delta).await;
        self.finish(message, result)
    }

    /// Forget every turn.
    pub fn clear(&mut self) {
        debug!(turns = self.history.len(), "Clearing conversation history");
        self.history.clear();
    }

    fn request_for(&self, message: &str, system_prompt: Option<&str>) -> ProviderRequest {
        let messages = self.build_messages(message, system_prompt);
        debug!(
            model = self.provider.model_id(),
            messages = messages.len(),
            with_system = messages.first().is_some_and(|m| m.role == Role::System),
            "Sending turn"
        );
        ProviderRequest {
            messages,
            settings: self.settings.clone(),
        }
    }

    async fn collect_stream<F>(
        &self,
        request: &ProviderRequest,
        mut on_delta: F,
    ) -> Result<ProviderResponse>
    where
        F: FnMut(&str) + Send,
    {
        let mut stream = self.provider.stream_text(request).await?;
        let mut response = ProviderResponse {
            text: String::new(),
            usage: Usage::default(),
            finish_reason: None,
        };

        while let Some(delta) = stream.next().await {
            let delta = delta?;
            if !delta.text.is_empty() {
                on_delta(&delta.text);
                response.text.push_str(&delta.text);
            }
            if let Some(usage) = delta.usage {
                response.usage = usage;
            }
            if delta.finish_reason.is_some() {
                response.finish_reason = delta.finish_reason;
            }
        }

        Ok(response)
    }

    fn finish(&mut self, message: &str, result: Result<ProviderResponse>) -> Reply {
        match result {
            // The API rejects empty `model` parts on replay.
            Ok(response) if response.text.is_empty() => {
                warn!("Remote call returned no text");
                Reply::failure("the model returned an empty answer")
            }
            Ok(response) => {
                self.history.push_exchange(message, response.text.clone());
                Reply::success(response.text, response.usage, response.finish_reason)
            }
            Err(err) => {
                warn!(error = %err, category = ?err.category(), "Remote call failed");
                Reply::failure(err)
            }
        }
    }
}

impl std::fmt::Debug for ConversationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationAgent")
            .field("model", &self.provider.model_id())
            .field("settings", &self.settings)
            .field("history", &self.history)
            .finish()
    }
}
