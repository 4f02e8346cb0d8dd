use std::sync::Arc;

use crate::chain::{AnswerSynthesizer, PromptSet, QueryRewriter, RagPipeline};
use crate::core::config::{AppConfig, MemoryBackend};
use crate::history::{
    ConversationMemory, ConversationStore, InMemoryConversationStore, RedisConversationStore,
};
use crate::llm::LlmService;
use crate::rag::{VectorGateway, WeaviateIndex};

pub mod error;

use error::InitializationError;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: RagPipeline,
    pub rewriter_llm: LlmService,
    pub synthesizer_llm: LlmService,
}

impl AppState {
    /// Builds the index client, conversation memory and both generation
    /// models from `config`, then wires them into the pipeline.
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let index = WeaviateIndex::new(&config.vector_index)
            .map_err(InitializationError::VectorIndex)?;
        let gateway = VectorGateway::new(Arc::new(index));

        let store: Arc<dyn ConversationStore> = match config.memory.backend {
            MemoryBackend::Redis => Arc::new(
                RedisConversationStore::connect(
                    &config.memory.redis_url,
                    config.memory.key_prefix.clone(),
                )
                .await
                .map_err(InitializationError::Memory)?,
            ),
            MemoryBackend::Memory => {
                tracing::warn!("Using in-process conversation memory; history is lost on restart");
                Arc::new(InMemoryConversationStore::new())
            }
        };
        let memory = ConversationMemory::new(store);

        let rewriter_llm =
            LlmService::from_config(&config.llm.rewriter).map_err(InitializationError::Llm)?;
        let synthesizer_llm =
            LlmService::from_config(&config.llm.synthesizer).map_err(InitializationError::Llm)?;

        let prompts = Arc::new(PromptSet::from_overrides(&config.prompts));
        let pipeline = RagPipeline::new(
            gateway,
            memory,
            QueryRewriter::new(rewriter_llm.clone(), prompts.clone()),
            AnswerSynthesizer::new(synthesizer_llm.clone(), prompts),
        );

        Ok(Arc::new(AppState {
            config: Arc::new(config),
            pipeline,
            rewriter_llm,
            synthesizer_llm,
        }))
    }
}
