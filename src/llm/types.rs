use serde::{Deserialize, Serialize};

use crate::core::config::ModelConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<i32>,
    pub stop: Option<Vec<String>>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
        }
    }

    /// Apply sampling settings from a model section of the config.
    pub fn with_config(mut self, config: &ModelConfig) -> Self {
        self.temperature = config.temperature.or(self.temperature);
        self.top_p = config.top_p.or(self.top_p);
        self.max_tokens = config.max_tokens.or(self.max_tokens);
        self
    }
}
