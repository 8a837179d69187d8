//! Session registry for the web front-end.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::error::ChatError;

use super::chat::{gemini_agent_factory, AgentFactory, ChatSession};

/// Opaque session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ChatError::SessionNotFound(s.to_string()))
    }
}

pub type SharedSession = Arc<Mutex<ChatSession>>;

struct Entry {
    session: SharedSession,
    last_used: Instant,
}

/// Owns every live chat session, one per browser tab.
///
/// Sessions end on an explicit [`remove`](Self::remove) or, when the tab
/// never says goodbye, through [`evict_idle`](Self::evict_idle).
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
    factory: AgentFactory,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(gemini_agent_factory())
    }
}

impl SessionStore {
    pub fn new(factory: AgentFactory) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory,
        }
    }

    /// Start a new, empty session.
    pub fn create(&self) -> SessionId {
        let id = SessionId::new();
        let session = ChatSession::new(id, self.factory.clone());
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Entry {
                    session: Arc::new(Mutex::new(session)),
                    last_used: Instant::now(),
                },
            );
        info!(session = %id, "Session started");
        id
    }

    /// Get an existing session and mark it as used.
    pub fn get(&self, id: SessionId) -> Result<SharedSession, ChatError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?;
        entry.last_used = Instant::now();
        Ok(entry.session.clone())
    }

    /// End a session. Returns whether it existed.
    pub fn remove(&self, id: SessionId) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            info!(session = %id, "Session ended");
        }
        removed
    }

    /// Drop sessions unused for longer than `max_idle`. Sessions with a turn
    /// in flight are kept. Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let idle = now.saturating_duration_since(entry.last_used) > max_idle;
            let busy = entry.session.try_lock().is_err();
            let keep = !idle || busy;
            if !keep {
                info!(session = %id, "Session expired");
            }
            keep
        });
        before - sessions.len()
    }

    /// List session IDs.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
