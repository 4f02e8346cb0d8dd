use std::sync::Arc;
use std::time::Duration;

use crate::core::config::ModelConfig;
use crate::core::errors::RagError;
use crate::llm::openai::OpenAiProvider;
use crate::llm::provider::LlmProvider;
use crate::llm::types::{ChatMessage, ChatRequest};

/// One configured generation model: a provider plus the model id and
/// sampling settings it is called with.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    config: ModelConfig,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>, config: ModelConfig) -> Self {
        Self { provider, config }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, RagError> {
        let provider = OpenAiProvider::new(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::new(Arc::new(provider), config.clone()))
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await.unwrap_or(false)
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, RagError> {
        let request = ChatRequest::new(messages).with_config(&self.config);
        tracing::debug!(
            provider = self.provider.name(),
            model = %self.config.model,
            messages = request.messages.len(),
            "sending chat completion"
        );
        self.provider.chat(request, &self.config.model).await
    }
}
