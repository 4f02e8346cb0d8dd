//! Redis-backed conversation store.
//!
//! Each session is a list key holding JSON-encoded turns, newest at the
//! head. Writes run as one MULTI/EXEC pipeline so the push, the trim and the
//! expiry refresh land together.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::store::{ConversationStore, ConversationTurn};
use crate::core::errors::RagError;

#[derive(Clone)]
pub struct RedisConversationStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisConversationStore {
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, RagError> {
        let client = redis::Client::open(url).map_err(|e| RagError::upstream("open redis", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| RagError::upstream("connect redis", e))?;
        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
        })
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn push(
        &self,
        session_id: &str,
        turn: &ConversationTurn,
        max_len: usize,
        ttl: Duration,
    ) -> Result<(), RagError> {
        let key = self.key(session_id);
        let payload = serde_json::to_string(turn)
            .map_err(|e| RagError::upstream(format!("encode turn for session {}", session_id), e))?;
        let mut conn = self.conn.clone();

        let _: () = redis::pipe()
            .atomic()
            .lpush(&key, payload)
            .ignore()
            .ltrim(&key, 0, max_len as isize - 1)
            .ignore()
            .expire(&key, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| RagError::upstream(format!("append to session {}", session_id), e))?;
        Ok(())
    }

    async fn recent(&self, session_id: &str, n: usize) -> Result<Vec<ConversationTurn>, RagError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .lrange(self.key(session_id), 0, n as isize - 1)
            .await
            .map_err(|e| RagError::upstream(format!("read session {}", session_id), e))?;

        Ok(raw
            .iter()
            .filter_map(|entry| match serde_json::from_str::<ConversationTurn>(entry) {
                Ok(turn) => Some(turn),
                Err(err) => {
                    tracing::warn!(session_id, "skipping undecodable turn: {}", err);
                    None
                }
            })
            .collect())
    }

    async fn touch(&self, session_id: &str, ttl: Duration) -> Result<(), RagError> {
        let mut conn = self.conn.clone();
        let _: bool = conn
            .expire(self.key(session_id), ttl.as_secs() as i64)
            .await
            .map_err(|e| RagError::upstream(format!("refresh session {}", session_id), e))?;
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), RagError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .del(self.key(session_id))
            .await
            .map_err(|e| RagError::upstream(format!("clear session {}", session_id), e))?;
        Ok(())
    }
}
