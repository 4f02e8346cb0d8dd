//! Weaviate implementation of `VectorIndex` over its REST and GraphQL API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use super::store::{Selection, VectorIndex};
use crate::core::config::VectorIndexConfig;
use crate::core::errors::RagError;

#[derive(Clone)]
pub struct WeaviateIndex {
    base_url: String,
    class_name: String,
    api_key: Option<String>,
    client: Client,
}

impl WeaviateIndex {
    pub fn new(config: &VectorIndexConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::upstream("build vector index client", e))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            class_name: config.class_name.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            client,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn object_url(&self, id: &str) -> String {
        format!("{}/v1/objects/{}/{}", self.base_url, self.class_name, id)
    }

    fn chapter_filter(chapter: &str) -> Value {
        json!({
            "path": ["chapter"],
            "operator": "Equal",
            "valueText": chapter,
        })
    }

    async fn graphql(&self, operation: &str, query: String) -> Result<Value, RagError> {
        let url = format!("{}/v1/graphql", self.base_url);
        tracing::debug!(operation, %query, "sending graphql query");

        let res = self
            .authorize(self.client.post(&url))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| RagError::upstream(operation, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::upstream(
                operation,
                format!("status {}: {}", status, text),
            ));
        }

        res.json().await.map_err(|e| RagError::upstream(operation, e))
    }

    async fn expect_success(
        operation: &str,
        res: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, RagError> {
        let res = res.map_err(|e| RagError::upstream(operation, e))?;
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        Err(RagError::upstream(
            operation,
            format!("status {}: {}", status, text),
        ))
    }
}

/// Quote a string as a GraphQL literal. JSON string escaping is valid
/// GraphQL string syntax.
fn literal(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn selection_fields(selection: Selection) -> &'static str {
    match selection {
        Selection::Chapter => "chapter",
        Selection::Id => "_additional { id }",
        Selection::Document => "chapter subsections { title content }",
    }
}

/// Exact-match `where` lookup on the chapter property.
fn chapter_query(class: &str, chapter: &str, selection: Selection, limit: Option<usize>) -> String {
    let limit = limit.map(|l| format!(", limit: {}", l)).unwrap_or_default();
    format!(
        "{{ Get {{ {class}(where: {{ path: [\"chapter\"], operator: Equal, valueText: {chapter} }}{limit}) {{ {fields} }} }} }}",
        class = class,
        chapter = literal(chapter),
        limit = limit,
        fields = selection_fields(selection),
    )
}

fn near_text_query(class: &str, concept: &str, max_distance: f32, limit: usize) -> String {
    format!(
        "{{ Get {{ {class}(nearText: {{ concepts: [{concept}], distance: {distance} }}, limit: {limit}) {{ {fields} }} }} }}",
        class = class,
        concept = literal(concept),
        distance = max_distance,
        limit = limit,
        fields = selection_fields(Selection::Document),
    )
}

#[async_trait]
impl VectorIndex for WeaviateIndex {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    async fn find_by_chapter(
        &self,
        chapter: &str,
        selection: Selection,
        limit: Option<usize>,
    ) -> Result<Value, RagError> {
        let query = chapter_query(&self.class_name, chapter, selection, limit);
        self.graphql("find by chapter", query).await
    }

    async fn near_text(
        &self,
        query: &str,
        max_distance: f32,
        limit: usize,
    ) -> Result<Value, RagError> {
        let query = near_text_query(&self.class_name, query, max_distance, limit);
        self.graphql("near text search", query).await
    }

    async fn create_batch(&self, objects: Vec<Value>) -> Result<Vec<Value>, RagError> {
        let url = format!("{}/v1/batch/objects", self.base_url);
        let objects: Vec<Value> = objects
            .into_iter()
            .map(|properties| json!({ "class": self.class_name, "properties": properties }))
            .collect();

        let res = Self::expect_success(
            "batch insert",
            self.authorize(self.client.post(&url))
                .json(&json!({ "objects": objects }))
                .send()
                .await,
        )
        .await?;

        res.json()
            .await
            .map_err(|e| RagError::upstream("batch insert", e))
    }

    async fn get_object(&self, id: &str) -> Result<Option<Value>, RagError> {
        let res = self
            .authorize(self.client.get(self.object_url(id)))
            .send()
            .await
            .map_err(|e| RagError::upstream(format!("read object {}", id), e))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let res = Self::expect_success(&format!("read object {}", id), Ok(res)).await?;
        let object = res
            .json()
            .await
            .map_err(|e| RagError::upstream(format!("read object {}", id), e))?;
        Ok(Some(object))
    }

    async fn replace_object(&self, id: &str, properties: Value) -> Result<(), RagError> {
        let body = json!({
            "class": self.class_name,
            "id": id,
            "properties": properties,
        });
        Self::expect_success(
            &format!("update object {}", id),
            self.authorize(self.client.put(self.object_url(id)))
                .json(&body)
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn delete_object(&self, id: &str) -> Result<(), RagError> {
        Self::expect_success(
            &format!("delete object {}", id),
            self.authorize(self.client.delete(self.object_url(id)))
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn delete_where_chapter(&self, chapter: &str) -> Result<Value, RagError> {
        let url = format!("{}/v1/batch/objects", self.base_url);
        let body = json!({
            "match": {
                "class": self.class_name,
                "where": Self::chapter_filter(chapter),
            },
            "output": "verbose",
        });
        let operation = format!("delete chapter {}", chapter);
        let res = Self::expect_success(
            &operation,
            self.authorize(self.client.delete(&url))
                .json(&body)
                .send()
                .await,
        )
        .await?;

        res.json().await.map_err(|e| RagError::upstream(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_escapes_quotes() {
        assert_eq!(literal(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(literal("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn test_base_url_is_normalised() {
        let config = VectorIndexConfig {
            url: "http://localhost:8080/".to_string(),
            ..VectorIndexConfig::default()
        };
        let index = WeaviateIndex::new(&config).unwrap();
        assert_eq!(
            index.object_url("abc"),
            "http://localhost:8080/v1/objects/Book/abc"
        );
    }

    #[test]
    fn test_near_text_query_carries_distance_limit_and_fields() {
        let query = near_text_query(
            "Book",
            "how to \"install\"",
            crate::rag::MAX_DISTANCE,
            crate::rag::RESULT_LIMIT,
        );
        assert_eq!(
            query,
            r#"{ Get { Book(nearText: { concepts: ["how to \"install\""], distance: 0.5 }, limit: 5) { chapter subsections { title content } } } }"#
        );
    }

    #[test]
    fn test_chapter_query_with_limit_selects_chapter_only() {
        let query = chapter_query("Book", "Intro", Selection::Chapter, Some(1));
        assert_eq!(
            query,
            r#"{ Get { Book(where: { path: ["chapter"], operator: Equal, valueText: "Intro" }, limit: 1) { chapter } } }"#
        );
    }

    #[test]
    fn test_chapter_query_for_ids_has_no_limit() {
        let query = chapter_query("Book", "Intro", Selection::Id, None);
        assert_eq!(
            query,
            r#"{ Get { Book(where: { path: ["chapter"], operator: Equal, valueText: "Intro" }) { _additional { id } } } }"#
        );
    }
}
