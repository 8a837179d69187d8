//! Conversation agent: turn history plus per-call message assembly.

pub mod agent;
pub mod history;

pub use agent::ConversationAgent;
pub use history::History;
