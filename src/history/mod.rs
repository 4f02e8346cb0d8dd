//! Session-scoped conversation memory.
//!
//! A session keeps a fixed window of its most recent turns and is forgotten
//! after a period without writes.

mod redis_store;
mod store;

use std::sync::Arc;
use std::time::Duration;

pub use redis_store::RedisConversationStore;
pub use store::{ConversationStore, ConversationTurn, InMemoryConversationStore, Role};

use crate::core::errors::RagError;

/// Number of turns kept per session.
pub const WINDOW: usize = 4;
/// Inactivity period after which a session is empty.
pub const SESSION_TTL: Duration = Duration::from_secs(300);

/// Windowed view of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    /// Turns in chronological order, oldest first.
    pub turns: Vec<ConversationTurn>,
    /// The same turns as a flat `Human: ... / AI: ...` transcript.
    pub chat_history: String,
}

impl ChatHistory {
    pub(crate) fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        let chat_history = turns
            .iter()
            .map(|t| format!("{}: {}", t.role.label(), t.content))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            turns,
            chat_history,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chat_history.is_empty()
    }
}

#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn ConversationStore>,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Load the session window and refresh its expiry.
    pub async fn get_history(&self, session_id: &str) -> Result<ChatHistory, RagError> {
        let mut turns = self.store.recent(session_id, WINDOW).await?;
        if turns.is_empty() {
            return Ok(ChatHistory::default());
        }
        self.store.touch(session_id, SESSION_TTL).await?;

        turns.reverse();
        Ok(ChatHistory::from_turns(turns))
    }

    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<(), RagError> {
        let turn = ConversationTurn::new(role, content);
        self.store.push(session_id, &turn, WINDOW, SESSION_TTL).await
    }

    pub async fn append_user(&self, session_id: &str, content: &str) -> Result<(), RagError> {
        self.append(session_id, Role::User, content).await
    }

    pub async fn append_assistant(&self, session_id: &str, content: &str) -> Result<(), RagError> {
        self.append(session_id, Role::Assistant, content).await
    }

    /// Append a question and its answer, in that order.
    pub async fn record_exchange(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), RagError> {
        self.append_user(session_id, question).await?;
        self.append_assistant(session_id, answer).await
    }

    pub async fn clear(&self, session_id: &str) -> Result<(), RagError> {
        self.store.clear(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> ConversationMemory {
        ConversationMemory::new(Arc::new(InMemoryConversationStore::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_is_empty() {
        let history = memory().get_history("fresh").await.unwrap();
        assert!(history.is_empty());
        assert!(history.turns.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_keeps_last_four_turns() {
        let memory = memory();
        for i in 0..7 {
            memory.append_user("s", &format!("turn {}", i)).await.unwrap();
        }

        let history = memory.get_history("s").await.unwrap();
        let contents: Vec<&str> = history.turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 3", "turn 4", "turn 5", "turn 6"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_format() {
        let memory = memory();
        memory
            .record_exchange("s", "What is RAG?", "Retrieval plus generation.")
            .await
            .unwrap();

        let history = memory.get_history("s").await.unwrap();
        assert_eq!(
            history.chat_history,
            "Human: What is RAG?\nAI: Retrieval plus generation."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_expires_after_ttl() {
        let memory = memory();
        memory.append_user("s", "hello").await.unwrap();

        tokio::time::advance(SESSION_TTL + Duration::from_secs(1)).await;
        assert!(memory.get_history("s").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_refreshes_ttl() {
        let memory = memory();
        memory.append_user("s", "hello").await.unwrap();

        tokio::time::advance(Duration::from_secs(250)).await;
        assert!(!memory.get_history("s").await.unwrap().is_empty());
        tokio::time::advance(Duration::from_secs(250)).await;
        assert!(!memory.get_history("s").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_are_independent() {
        let memory = memory();
        memory.append_user("a", "only in a").await.unwrap();
        assert!(memory.get_history("b").await.unwrap().is_empty());

        memory.clear("a").await.unwrap();
        assert!(memory.get_history("a").await.unwrap().is_empty());
    }
}
