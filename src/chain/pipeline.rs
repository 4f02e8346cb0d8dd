use serde::{Deserialize, Serialize};

use super::rewriter::QueryRewriter;
use super::synthesizer::AnswerSynthesizer;
use crate::core::errors::RagError;
use crate::history::ConversationMemory;
use crate::rag::{
    Document, IngestionBatch, IngestionReceipt, ObjectId, OperationMessage, VectorGateway,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub session_id: String,
    pub raw_question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub text: String,
}

/// Trim and fold the question onto a single line.
pub fn normalize_question(raw: &str) -> Result<String, RagError> {
    let question = raw.trim().replace(['\r', '\n'], " ");
    if question.trim().is_empty() {
        return Err(RagError::ValidationFailed(
            "question must not be empty".to_string(),
        ));
    }
    Ok(question)
}

/// Query and ingestion entry points of the service.
#[derive(Clone)]
pub struct RagPipeline {
    gateway: VectorGateway,
    memory: ConversationMemory,
    rewriter: QueryRewriter,
    synthesizer: AnswerSynthesizer,
}

impl RagPipeline {
    pub fn new(
        gateway: VectorGateway,
        memory: ConversationMemory,
        rewriter: QueryRewriter,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            gateway,
            memory,
            rewriter,
            synthesizer,
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    #[tracing::instrument(skip(self, request), fields(session = %request.session_id))]
    pub async fn ask(&self, request: QueryRequest) -> Result<AnswerResponse, RagError> {
        if request.session_id.trim().is_empty() {
            return Err(RagError::ValidationFailed(
                "session id must not be empty".to_string(),
            ));
        }
        let question = normalize_question(&request.raw_question)?;

        // 1. Session window
        let history = self.memory.get_history(&request.session_id).await?;

        // 2. Standalone question, only when there is something to resolve against
        let standalone = if history.is_empty() {
            question.clone()
        } else {
            self.rewriter.rewrite(&history, &question).await?
        };
        tracing::info!(question = %standalone, "question used for retrieval");

        // 3. Retrieval
        let documents = self.gateway.get_closest_vectors(&standalone).await?;

        // 4. Grounded answer
        let text = self
            .synthesizer
            .synthesize(&history, &documents, &standalone)
            .await?;

        // 5. Remember the exchange
        if let Err(err) = self
            .memory
            .record_exchange(&request.session_id, &question, &text)
            .await
        {
            tracing::warn!("Failed to record exchange in conversation memory: {}", err);
        }

        Ok(AnswerResponse { text })
    }

    pub async fn ingest(&self, batch: &IngestionBatch) -> Result<IngestionReceipt, RagError> {
        self.gateway.create_vectors(batch).await
    }

    pub async fn object_id_for_chapter(&self, chapter: &str) -> Result<ObjectId, RagError> {
        self.gateway.get_object_id_by_chapter(chapter).await
    }

    pub async fn delete_object(&self, id: &str) -> Result<OperationMessage, RagError> {
        self.gateway.delete_object_by_id(id).await
    }

    pub async fn update_object(
        &self,
        id: &str,
        document: &Document,
    ) -> Result<OperationMessage, RagError> {
        self.gateway.update_object_by_id(document, id).await
    }

    pub async fn delete_chapter(&self, chapter: &str) -> Result<OperationMessage, RagError> {
        self.gateway.delete_chapter(chapter).await
    }

    pub async fn clear_session(&self, session_id: &str) -> Result<(), RagError> {
        self.memory.clear(session_id).await
    }
}
