//! Message types for model communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::generation::FinishReason;
use super::usage::Usage;

/// Conversation role as seen by the remote API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged entry in the payload sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMessage {
    /// Message role.
    pub role: Role,
    /// Plain text content.
    pub content: String,
}

impl ModelMessage {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Who produced a turn. System instructions never become turns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// One completed message in the conversation history.
///
/// Turns are immutable once created; fields are only readable.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Turn {
    role: TurnRole,
    content: String,
    timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl From<&Turn> for ModelMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role.into(),
            content: turn.content.clone(),
        }
    }
}

/// What the agent hands back for one `send`.
///
/// A failed remote call still produces a `Reply`: `text` carries the error
/// description, `usage` is `None` and `is_error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    /// Answer text, or `Error: ...` for a failed call.
    pub text: String,
    /// Token usage; `None` when the call failed.
    pub usage: Option<Usage>,
    /// Finish reason reported by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Set only by [`Reply::failure`].
    #[serde(default)]
    pub is_error: bool,
}

impl Reply {
    /// A successful answer.
    pub fn success(text: String, usage: Usage, finish_reason: Option<FinishReason>) -> Self {
        Self {
            text,
            usage: Some(usage),
            finish_reason,
            is_error: false,
        }
    }

    /// Build the reply shown when the remote call failed.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error: {error}"),
            usage: None,
            finish_reason: None,
            is_error: true,
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_converts_to_matching_role() {
        let msg = ModelMessage::from(&Turn::assistant("hello"));
        assert_eq!(msg, ModelMessage::assistant("hello"));
    }

    #[test]
    fn role_parses_lowercase() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(Role::System.to_string(), "system");
    }

    #[test]
    fn failure_reply_has_no_usage() {
        let reply = Reply::failure("boom");
        assert_eq!(reply.text, "Error: boom");
        assert!(reply.usage.is_none());
        assert!(reply.is_error());
    }

    #[test]
    fn unusual_finish_reason_is_not_a_failure() {
        let reply = Reply::success("answer".into(), Usage::new(1, 2, 3), Some(FinishReason::Other));
        assert!(!reply.is_error());
        assert_eq!(reply.usage, Some(Usage::new(1, 2, 3)));
    }
}
