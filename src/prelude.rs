//! Convenience re-exports for common use.

pub use crate::agent::{ConversationAgent, History};
pub use crate::config::ChatConfig;
pub use crate::error::{ChatError, Result};
pub use crate::models::GeminiModel;
pub use crate::provider::{ChatProvider, GeminiProvider};
pub use crate::types::{GenerationSettings, ModelMessage, Reply, Role, Turn, TurnRole, Usage};
