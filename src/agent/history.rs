//! Ordered, pairwise-append turn history.

use serde::Serialize;

use crate::types::{ModelMessage, Turn};

/// Turns of one conversation, oldest first.
///
/// Turns are only ever added as a completed user/assistant exchange, so the
/// length is always even.
#[derive(Debug, Clone, Default, Serialize)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed exchange.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::assistant(assistant));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of completed exchanges.
    pub fn exchanges(&self) -> usize {
        self.turns.len() / 2
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Replay every turn as a payload message.
    pub fn to_messages(&self) -> impl Iterator<Item = ModelMessage> + '_ {
        self.turns.iter().map(ModelMessage::from)
    }
}
