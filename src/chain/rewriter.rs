use std::sync::Arc;

use super::prompts::PromptSet;
use crate::core::errors::RagError;
use crate::history::ChatHistory;
use crate::llm::{ChatMessage, LlmService};

/// Turns a follow-up question into one that stands on its own, using the
/// session transcript.
#[derive(Clone)]
pub struct QueryRewriter {
    llm: LlmService,
    prompts: Arc<PromptSet>,
}

impl QueryRewriter {
    pub fn new(llm: LlmService, prompts: Arc<PromptSet>) -> Self {
        Self { llm, prompts }
    }

    pub async fn rewrite(&self, history: &ChatHistory, follow_up: &str) -> Result<String, RagError> {
        let messages = vec![
            ChatMessage::system(self.prompts.rewrite_system.clone()),
            ChatMessage::user(
                self.prompts
                    .render_rewrite(&history.chat_history, follow_up),
            ),
        ];

        let completion = self.llm.chat(messages).await?;
        let question = first_line(&completion).ok_or_else(|| {
            RagError::upstream("question rewrite", "model returned an empty completion")
        })?;

        tracing::debug!(original = follow_up, standalone = %question, "question rewritten");
        Ok(question)
    }
}

fn first_line(completion: &str) -> Option<String> {
    completion
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
