use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::core::errors::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "human")]
    User,
    #[serde(rename = "ai")]
    Assistant,
}

impl Role {
    /// Speaker label used in transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "Human",
            Role::Assistant => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Per-session turn log with expiry, stored most-recent-first.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Prepend `turn`, keep at most `max_len` entries and reset the expiry to
    /// `ttl`. Either all three take effect or the call fails.
    async fn push(
        &self,
        session_id: &str,
        turn: &ConversationTurn,
        max_len: usize,
        ttl: Duration,
    ) -> Result<(), RagError>;

    /// Up to `n` most recent turns, newest first. Expired or unknown
    /// sessions yield an empty list.
    async fn recent(&self, session_id: &str, n: usize) -> Result<Vec<ConversationTurn>, RagError>;

    /// Reset the expiry of an existing session.
    async fn touch(&self, session_id: &str, ttl: Duration) -> Result<(), RagError>;

    async fn clear(&self, session_id: &str) -> Result<(), RagError>;
}

struct SessionLog {
    turns: VecDeque<ConversationTurn>,
    expires_at: Instant,
}

/// Process-local store driven by the tokio clock.
#[derive(Default)]
pub struct InMemoryConversationStore {
    sessions: Mutex<HashMap<String, SessionLog>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionLog>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn session_count(&self) -> usize {
        self.lock().len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn push(
        &self,
        session_id: &str,
        turn: &ConversationTurn,
        max_len: usize,
        ttl: Duration,
    ) -> Result<(), RagError> {
        let now = Instant::now();
        let mut sessions = self.lock();
        sessions.retain(|_, log| log.expires_at > now);
        let log = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionLog {
                turns: VecDeque::new(),
                expires_at: now,
            });
        log.turns.push_front(turn.clone());
        log.turns.truncate(max_len);
        log.expires_at = now + ttl;
        Ok(())
    }

    async fn recent(&self, session_id: &str, n: usize) -> Result<Vec<ConversationTurn>, RagError> {
        let mut sessions = self.lock();
        let expired = match sessions.get(session_id) {
            None => return Ok(Vec::new()),
            Some(log) => log.expires_at <= Instant::now(),
        };
        if expired {
            sessions.remove(session_id);
            return Ok(Vec::new());
        }
        Ok(sessions
            .get(session_id)
            .map(|log| log.turns.iter().take(n).cloned().collect())
            .unwrap_or_default())
    }

    async fn touch(&self, session_id: &str, ttl: Duration) -> Result<(), RagError> {
        let now = Instant::now();
        if let Some(log) = self.lock().get_mut(session_id) {
            if log.expires_at > now {
                log.expires_at = now + ttl;
            }
        }
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), RagError> {
        self.lock().remove(session_id);
        Ok(())
    }
}
