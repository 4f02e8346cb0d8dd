use std::sync::Arc;

use super::prompts::PromptSet;
use crate::core::errors::RagError;
use crate::history::ChatHistory;
use crate::llm::{ChatMessage, LlmService};
use crate::rag::Document;

/// Produces the final answer from the transcript, the retrieved documents and
/// the standalone question.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: LlmService,
    prompts: Arc<PromptSet>,
}

impl AnswerSynthesizer {
    pub fn new(llm: LlmService, prompts: Arc<PromptSet>) -> Self {
        Self { llm, prompts }
    }

    pub async fn synthesize(
        &self,
        history: &ChatHistory,
        context: &[Document],
        question: &str,
    ) -> Result<String, RagError> {
        let context = render_context(context);
        let messages = vec![
            ChatMessage::system(self.prompts.answer_system.clone()),
            ChatMessage::user(self.prompts.render_answer(
                &history.chat_history,
                &context,
                question,
            )),
        ];

        let answer = self.llm.chat(messages).await?;
        tracing::debug!(model = self.llm.model(), chars = answer.len(), "answer synthesized");
        Ok(answer)
    }
}

/// One JSON document per line.
fn render_context(documents: &[Document]) -> String {
    documents
        .iter()
        .filter_map(|doc| match serde_json::to_string(doc) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::warn!(chapter = %doc.chapter, "skipping unserializable document: {}", err);
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
