use thiserror::Error;

use crate::core::errors::RagError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to initialize vector index client: {0}")]
    VectorIndex(#[source] RagError),

    #[error("Failed to initialize conversation memory: {0}")]
    Memory(#[source] RagError),

    #[error("Failed to initialize LLM service: {0}")]
    Llm(#[source] RagError),
}
