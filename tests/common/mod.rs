//! Shared test helpers: a scripted provider that records every request.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;

use gemini_chat::agent::ConversationAgent;
use gemini_chat::error::{ChatError, Result};
use gemini_chat::provider::{ChatProvider, ProviderRequest, ProviderResponse};
use gemini_chat::types::*;

enum Scripted {
    Reply(String),
    Fail(u16, String),
    /// Stream the text, then break with a stream error.
    BreakAfter(String),
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

/// Provider returning queued replies. Clones share state, so a test keeps a
/// handle after moving one into an agent.
#[derive(Clone, Default)]
pub struct CaptureProvider {
    inner: Arc<Inner>,
}

pub fn usage() -> Usage {
    Usage::new(10, 20, 30)
}

impl CaptureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_response(&self, text: &str) -> &Self {
        self.push(Scripted::Reply(text.to_string()))
    }

    pub fn queue_failure(&self, status: u16, message: &str) -> &Self {
        self.push(Scripted::Fail(status, message.to_string()))
    }

    pub fn queue_broken_stream(&self, partial: &str) -> &Self {
        self.push(Scripted::BreakAfter(partial.to_string()))
    }

    fn push(&self, item: Scripted) -> &Self {
        self.inner.script.lock().unwrap().push_back(item);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn last_messages(&self) -> Vec<ModelMessage> {
        self.requests()
            .last()
            .map(|r| r.messages.clone())
            .unwrap_or_default()
    }

    pub fn agent(&self) -> ConversationAgent {
        ConversationAgent::new(Box::new(self.clone()))
    }

    fn next(&self, request: &ProviderRequest) -> Scripted {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.inner
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::Reply("Mock response".to_string()))
    }
}

#[async_trait]
impl ChatProvider for CaptureProvider {
    fn model_id(&self) -> &str {
        "capture-model"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        match self.next(request) {
            Scripted::Reply(text) => Ok(ProviderResponse {
                text,
                usage: usage(),
                finish_reason: Some(FinishReason::Stop),
            }),
            Scripted::Fail(status, message) => Err(ChatError::api(status, message)),
            Scripted::BreakAfter(_) => Err(ChatError::Stream("connection reset".into())),
        }
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>> {
        let (text, broken) = match self.next(request) {
            Scripted::Reply(text) => (text, false),
            Scripted::BreakAfter(text) => (text, true),
            Scripted::Fail(status, message) => return Err(ChatError::api(status, message)),
        };

        let stream = async_stream::stream! {
            for chunk in text.chars().collect::<Vec<_>>().chunks(5) {
                yield Ok(TextStreamDelta::text(chunk.iter().collect::<String>()));
            }
            if broken {
                yield Err(ChatError::Stream("connection reset".into()));
                return;
            }
            yield Ok(TextStreamDelta {
                text: String::new(),
                event_type: StreamEventType::Done,
                finish_reason: Some(FinishReason::Stop),
                usage: Some(usage()),
            });
        };

        Ok(Box::pin(stream))
    }
}
