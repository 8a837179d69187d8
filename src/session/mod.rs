//! Explicit per-user chat sessions.

pub mod chat;
pub mod store;

pub use chat::{
    gemini_agent_factory, AgentFactory, ChatSession, FormSettings, SessionSnapshot,
    TranscriptEntry, TurnOutcome, API_KEY_GUIDANCE,
};
pub use store::{SessionId, SessionStore, SharedSession};
