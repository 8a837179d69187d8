//! One chat session: the agent plus the transcript shown to the user.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::ConversationAgent;
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::models::GeminiModel;
use crate::types::{Reply, TurnRole, Usage};

use super::store::SessionId;

/// Shown instead of calling the API while no key is configured.
pub const API_KEY_GUIDANCE: &str = "Please enter your Google API key to start chatting. \
You can create one in Google AI Studio: https://aistudio.google.com/app/apikey";

/// Builds an agent from the resolved configuration.
pub type AgentFactory = Arc<dyn Fn(&ChatConfig) -> Result<ConversationAgent> + Send + Sync>;

/// The default factory: a Gemini-backed agent.
pub fn gemini_agent_factory() -> AgentFactory {
    Arc::new(ConversationAgent::from_config)
}

/// Values from the configuration form, sent along with each message.
///
/// Missing fields fall back to the server-side [`ChatConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<GeminiModel>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl FormSettings {
    /// Overlay the form on top of `base`.
    pub fn resolve(&self, base: &ChatConfig) -> ChatConfig {
        let mut config = base.clone();
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            config.set_api_key(key);
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(ref prompt) = self.system_prompt {
            config.system_prompt = Some(prompt.trim().to_string()).filter(|p| !p.is_empty());
        }
        config
    }
}

/// A line in the visible transcript.
///
/// Unlike the agent history, the transcript also keeps failed attempts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranscriptEntry {
    pub role: TurnRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    fn user(content: &str) -> Self {
        Self {
            role: TurnRole::User,
            content: content.to_string(),
            usage: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    fn assistant(reply: &Reply) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: reply.text.clone(),
            usage: reply.usage,
            is_error: reply.is_error(),
            timestamp: Utc::now(),
        }
    }
}

/// Result of submitting a message.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    Reply(Reply),
    /// Configuration is incomplete; nothing was sent.
    Guidance { message: String },
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub model: Option<String>,
    pub messages: Vec<TranscriptEntry>,
    pub history_len: usize,
    pub total_usage: Usage,
    pub created_at: DateTime<Utc>,
}

pub struct ChatSession {
    id: SessionId,
    factory: AgentFactory,
    agent: Option<ConversationAgent>,
    transcript: Vec<TranscriptEntry>,
    total_usage: Usage,
    created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(id: SessionId, factory: AgentFactory) -> Self {
        Self {
            id,
            factory,
            agent: None,
            transcript: Vec::new(),
            total_usage: Usage::default(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn agent(&self) -> Option<&ConversationAgent> {
        self.agent.as_ref()
    }

    pub fn total_usage(&self) -> Usage {
        self.total_usage
    }

    /// Send `message` and wait for the complete reply.
    pub async fn submit(
        &mut self,
        base: &ChatConfig,
        form: &FormSettings,
        message: &str,
    ) -> Result<TurnOutcome> {
        self.submit_streaming(base, form, message, |_| {}).await
    }

    /// Send `message`, forwarding text chunks to `on_delta` as they arrive.
    pub async fn submit_streaming<F>(
        &mut self,
        base: &ChatConfig,
        form: &FormSettings,
        message: &str,
        on_delta: F,
    ) -> Result<TurnOutcome>
    where
        F: FnMut(&str) + Send,
    {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidArgument("message is empty".into()));
        }

        let config = form.resolve(base);
        if !config.has_api_key() {
            return Ok(TurnOutcome::Guidance {
                message: API_KEY_GUIDANCE.to_string(),
            });
        }

        let agent = match self.agent {
            Some(ref mut agent) => agent,
            None => {
                let agent = (self.factory)(&config)?;
                info!(session = %self.id, model = agent.model_id(), "Agent connected");
                self.agent.insert(agent)
            }
        };

        self.transcript.push(TranscriptEntry::user(message));
        let reply = agent
            .send_streaming(message, config.system_prompt.as_deref(), on_delta)
            .await;

        if let Some(usage) = reply.usage {
            self.total_usage.merge(&usage);
        }
        self.transcript.push(TranscriptEntry::assistant(&reply));
        Ok(TurnOutcome::Reply(reply))
    }

    /// Empty the transcript and history and drop the agent, so the next
    /// message reconnects with the current form values.
    pub fn clear(&mut self) {
        if let Some(agent) = self.agent.as_mut() {
            agent.clear();
        }
        self.agent = None;
        self.transcript.clear();
        self.total_usage = Usage::default();
        info!(session = %self.id, "Chat cleared");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            model: self.agent.as_ref().map(|a| a.model_id().to_string()),
            messages: self.transcript.clone(),
            history_len: self.agent.as_ref().map_or(0, |a| a.history().len()),
            total_usage: self.total_usage,
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("agent", &self.agent)
            .field("transcript", &self.transcript.len())
            .finish()
    }
}
