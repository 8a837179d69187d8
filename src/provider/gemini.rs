//! Google Gemini REST provider.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::models::GeminiModel;
use crate::types::*;
use crate::util::retry::RetryPolicy;

use super::http::{build_client, parse_sse_data, status_to_error};
use super::{ChatProvider, ProviderRequest, ProviderResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiProvider {
    model: GeminiModel,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        model: GeminiModel,
        api_key: String,
        base_url: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            model,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
            client: build_client(timeout)?,
        })
    }

    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model.as_str(), method)
    }

    /// Translate the role-tagged message list into a Gemini request body.
    pub fn build_request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => system_parts.push(serde_json::json!({ "text": msg.content })),
                Role::User => contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{ "text": msg.content }],
                })),
                Role::Assistant => contents.push(serde_json::json!({
                    "role": "model",
                    "parts": [{ "text": msg.content }],
                })),
            }
        }

        let mut body = serde_json::Map::new();
        body.insert("contents".into(), contents.into());
        if !system_parts.is_empty() {
            body.insert(
                "systemInstruction".into(),
                serde_json::json!({ "parts": system_parts }),
            );
        }

        let settings = &request.settings;
        let mut gen_config = serde_json::Map::new();
        if let Some(max) = settings.max_tokens {
            gen_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            gen_config.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            gen_config.insert("topP".into(), top_p.into());
        }
        if let Some(top_k) = settings.top_k {
            gen_config.insert("topK".into(), top_k.into());
        }
        if let Some(ref stops) = settings.stop_sequences {
            gen_config.insert("stopSequences".into(), serde_json::json!(stops));
        }
        if !gen_config.is_empty() {
            body.insert("generationConfig".into(), gen_config.into());
        }

        serde_json::Value::Object(body)
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn model_id(&self) -> &str {
        self.model.as_str()
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = Self::build_request_body(request);
        let url = self.endpoint("generateContent");

        debug!(
            model = self.model.as_str(),
            messages = request.messages.len(),
            "Gemini generateContent"
        );

        let (url, body) = (&url, &body);
        self.retry
            .execute(move || async move {
                let data: GeminiResponse = self.post(url, body).await?.json().await?;
                data.into_provider_response()
            })
            .await
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>> {
        let body = Self::build_request_body(request);
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));

        debug!(
            model = self.model.as_str(),
            messages = request.messages.len(),
            "Gemini streamGenerateContent"
        );

        // Only establishing the stream is retried; a broken stream is surfaced.
        let (url, body) = (&url, &body);
        let resp = self.retry.execute(move || self.post(url, body)).await?;
        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut usage = None;
            let mut finish_reason = None;
            let mut raw_finish_reason: Option<String> = None;
            let mut saw_text = false;
            futures::pin_mut!(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ChatError::Network(e));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let Some(data) = parse_sse_data(line.trim()) else {
                        continue;
                    };
                    let chunk: GeminiResponse = match serde_json::from_str(data) {
                        Ok(c) => c,
                        Err(e) => {
                            yield Err(ChatError::Stream(format!("malformed chunk: {e}")));
                            return;
                        }
                    };
                    if let Some(u) = chunk.usage_metadata.as_ref() {
                        usage = Some(u.to_usage());
                    }
                    let Some(candidate) = chunk.candidates.into_iter().next() else {
                        if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
                            yield Err(ChatError::Stream(format!("prompt blocked: {reason}")));
                            return;
                        }
                        continue;
                    };
                    if let Some(reason) = candidate.finish_reason.as_deref() {
                        finish_reason = FinishReason::from_gemini(reason);
                        raw_finish_reason = Some(reason.to_string());
                    }
                    let text = candidate.text();
                    if !text.is_empty() {
                        saw_text = true;
                        yield Ok(TextStreamDelta::text(text));
                    }
                }
            }

            if !saw_text {
                yield Err(no_text_error(raw_finish_reason.as_deref()));
                return;
            }

            yield Ok(TextStreamDelta {
                text: String::new(),
                event_type: StreamEventType::Done,
                finish_reason: finish_reason.or(Some(FinishReason::Stop)),
                usage,
            });
        };

        Ok(Box::pin(stream))
    }
}

/// A candidate without text (for example a safety block) is not an answer.
fn no_text_error(finish_reason: Option<&str>) -> ChatError {
    let reason = finish_reason.unwrap_or("no text");
    ChatError::api(200, format!("Gemini returned no answer: {reason}"))
}

// Wire types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

impl GeminiResponse {
    fn into_provider_response(self) -> Result<ProviderResponse> {
        let usage = self
            .usage_metadata
            .as_ref()
            .map(GeminiUsage::to_usage)
            .unwrap_or_default();

        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(ChatError::api(200, format!("Gemini returned no answer: {reason}")));
        };

        let text = candidate.text();
        if text.is_empty() {
            return Err(no_text_error(candidate.finish_reason.as_deref()));
        }

        Ok(ProviderResponse {
            text,
            usage,
            finish_reason: candidate
                .finish_reason
                .as_deref()
                .and_then(FinishReason::from_gemini),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

impl GeminiCandidate {
    fn text(&self) -> String {
        self.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl GeminiUsage {
    fn to_usage(&self) -> Usage {
        Usage::new(
            self.prompt_token_count,
            self.candidates_token_count,
            self.total_token_count,
        )
    }
}
