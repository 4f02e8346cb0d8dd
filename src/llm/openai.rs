use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::RagError;

/// Provider for any OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::upstream("build generation client", e))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

fn completion_body(request: &ChatRequest, model_id: &str) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
        if let Some(t) = request.top_p { obj.insert("top_p".to_string(), json!(t)); }
        if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
        if let Some(s) = &request.stop { obj.insert("stop".to_string(), json!(s)); }
    }
    body
}

fn completion_text(payload: &Value) -> Option<&str> {
    payload["choices"][0]["message"]["content"].as_str()
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.authorize(self.client.get(&url)).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let operation = format!("generation with {}", model_id);

        let res = self
            .authorize(self.client.post(&url))
            .json(&completion_body(&request, model_id))
            .send()
            .await
            .map_err(|e| RagError::upstream(&operation, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::upstream(
                &operation,
                format!("status {}: {}", status, text),
            ));
        }

        let payload: Value = res.json().await.map_err(|e| RagError::upstream(&operation, e))?;

        completion_text(&payload)
            .map(str::to_string)
            .ok_or_else(|| RagError::upstream(&operation, "response carried no message content"))
    }
}
