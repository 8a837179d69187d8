//! Streaming types.

use serde::{Deserialize, Serialize};

use super::generation::FinishReason;
use super::usage::Usage;

/// A delta emitted during streaming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStreamDelta {
    /// The incremental text chunk.
    pub text: String,
    /// Event type.
    pub event_type: StreamEventType,
    /// Finish reason (only on the final delta).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Usage (typically only on the final delta).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl TextStreamDelta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            event_type: StreamEventType::TextDelta,
            finish_reason: None,
            usage: None,
        }
    }
}

/// Type of stream event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// A chunk of answer text.
    TextDelta,
    /// End of stream; carries usage and finish reason.
    Done,
}
