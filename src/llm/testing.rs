//! Scripted `LlmProvider` for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::RagError;

#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, RagError>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(RagError::upstream("generation", message)));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, RagError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RagError::upstream("generation", "no scripted reply left")))
    }
}
