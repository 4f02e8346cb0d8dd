//! Typed decoding of vector service responses.
//!
//! The service answers with dynamically shaped JSON. Everything that leaves
//! this module is either a typed value or a `ParseError`.

use serde_json::Value;
use thiserror::Error;

use super::types::{BatchDeleteSummary, Document, Subsection};
use crate::core::errors::RagError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("response error: {0}")]
    ServiceErrors(String),
    #[error("invalid response structure: missing '{0}' key")]
    MissingKey(String),
    #[error("invalid response structure: '{0}' has unexpected type")]
    UnexpectedType(String),
    #[error("invalid item format in response")]
    InvalidItem,
}

impl ParseError {
    /// Attach the operation and key the response belonged to.
    pub fn into_rag(self, context: &str) -> RagError {
        RagError::QueryFailed(format!("{}: {}", context, self))
    }
}

/// Messages reported in the envelope's top-level `errors` array, if any.
fn service_errors(envelope: &Value) -> Option<String> {
    let errors = envelope.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
        .collect();
    Some(messages.join(", "))
}

/// Items returned for `class` in a `Get` query. A `null` class entry is an
/// empty result; a missing one is a malformed response.
pub fn class_items<'a>(envelope: &'a Value, class: &str) -> Result<&'a [Value], ParseError> {
    if let Some(messages) = service_errors(envelope) {
        return Err(ParseError::ServiceErrors(messages));
    }

    let get = envelope
        .get("data")
        .and_then(|d| d.get("Get"))
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::MissingKey("Get".to_string()))?;

    match get.get(class) {
        None => Err(ParseError::MissingKey(class.to_string())),
        Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(ParseError::UnexpectedType(class.to_string())),
    }
}

fn parse_subsections(item: &serde_json::Map<String, Value>) -> Vec<Subsection> {
    let Some(raw) = item.get("subsections").and_then(Value::as_array) else {
        return Vec::new();
    };

    raw.iter()
        .filter_map(Value::as_object)
        .map(|sub| Subsection {
            title: sub
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            content: sub
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

/// Decode search hits and merge the ones sharing a chapter.
///
/// Subsections of hits with the same chapter are concatenated in result
/// order, and chapters keep the order of their first hit.
pub fn merge_by_chapter(items: &[Value]) -> Result<Vec<Document>, ParseError> {
    let mut documents: Vec<Document> = Vec::new();

    for item in items {
        let item = item.as_object().ok_or(ParseError::InvalidItem)?;
        let chapter = item
            .get("chapter")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let subsections = parse_subsections(item);

        match documents.iter_mut().find(|doc| doc.chapter == chapter) {
            Some(doc) => doc.subsections.extend(subsections),
            None => documents.push(Document::new(chapter, subsections)),
        }
    }

    Ok(documents)
}

/// Identifier of the first hit, read from `_additional.id`.
pub fn first_id(items: &[Value]) -> Result<Option<String>, ParseError> {
    let Some(first) = items.first() else {
        return Ok(None);
    };
    first
        .get("_additional")
        .and_then(|a| a.get("id"))
        .and_then(Value::as_str)
        .map(|id| Some(id.to_string()))
        .ok_or_else(|| ParseError::MissingKey("_additional.id".to_string()))
}

/// Error messages attached to individual objects of a batch insert.
pub fn batch_errors(results: &[Value]) -> Vec<String> {
    results
        .iter()
        .filter_map(|r| {
            r.get("result")
                .and_then(|res| res.get("errors"))
                .and_then(|errs| errs.get("error"))
                .and_then(Value::as_array)
        })
        .flatten()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

pub fn delete_summary(envelope: &Value) -> Result<BatchDeleteSummary, ParseError> {
    let results = envelope
        .get("results")
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::MissingKey("results".to_string()))?;
    let count = |key: &str| results.get(key).and_then(Value::as_u64).unwrap_or(0);

    Ok(BatchDeleteSummary {
        matched: count("matches"),
        deleted: count("successful"),
        failed: count("failed"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(chapter: &str, subs: &[(&str, &str)]) -> Value {
        json!({
            "chapter": chapter,
            "subsections": subs
                .iter()
                .map(|(t, c)| json!({"title": t, "content": c}))
                .collect::<Vec<_>>(),
        })
    }

    #[test]
    fn test_merge_concatenates_per_chapter_in_result_order() {
        let items = vec![
            hit("A", &[("a1", "one")]),
            hit("B", &[("b1", "two")]),
            hit("A", &[("a2", "three"), ("a3", "four")]),
            hit("B", &[("b2", "five")]),
            hit("A", &[("a4", "six")]),
        ];

        let docs = merge_by_chapter(&items).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].chapter, "A");
        assert_eq!(docs[1].chapter, "B");

        let a_titles: Vec<&str> = docs[0].subsections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(a_titles, vec!["a1", "a2", "a3", "a4"]);
        let b_titles: Vec<&str> = docs[1].subsections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(b_titles, vec!["b1", "b2"]);
    }

    #[test]
    fn test_merge_skips_malformed_subsections() {
        let items = vec![json!({
            "chapter": "A",
            "subsections": [{"title": "ok", "content": "c"}, "garbage", 7]
        })];
        let docs = merge_by_chapter(&items).unwrap();
        assert_eq!(docs[0].subsections.len(), 1);
    }

    #[test]
    fn test_merge_rejects_non_object_item() {
        let items = vec![json!("not an object")];
        assert_eq!(merge_by_chapter(&items), Err(ParseError::InvalidItem));
    }

    #[test]
    fn test_class_items_reports_service_errors_joined() {
        let envelope = json!({
            "data": {"Get": {"Book": null}},
            "errors": [{"message": "first"}, {"message": "second"}]
        });
        let err = class_items(&envelope, "Book").unwrap_err();
        assert_eq!(err, ParseError::ServiceErrors("first, second".to_string()));
    }

    #[test]
    fn test_class_items_requires_get_key() {
        let envelope = json!({"data": {}});
        let err = class_items(&envelope, "Book").unwrap_err();
        assert_eq!(err, ParseError::MissingKey("Get".to_string()));
    }

    #[test]
    fn test_class_items_requires_class_key() {
        let envelope = json!({"data": {"Get": {}}});
        let err = class_items(&envelope, "Book").unwrap_err();
        assert_eq!(err, ParseError::MissingKey("Book".to_string()));
    }

    #[test]
    fn test_class_items_null_is_empty() {
        let envelope = json!({"data": {"Get": {"Book": null}}});
        assert!(class_items(&envelope, "Book").unwrap().is_empty());
    }

    #[test]
    fn test_first_id_reads_additional() {
        let items = vec![json!({"_additional": {"id": "abc-123"}})];
        assert_eq!(first_id(&items).unwrap(), Some("abc-123".to_string()));
        assert_eq!(first_id(&[]).unwrap(), None);
    }

    #[test]
    fn test_batch_errors_collects_messages() {
        let results = vec![
            json!({"result": {}}),
            json!({"result": {"errors": {"error": [{"message": "vectorizer down"}]}}}),
        ];
        assert_eq!(batch_errors(&results), vec!["vectorizer down".to_string()]);
    }

    #[test]
    fn test_delete_summary() {
        let envelope = json!({"results": {"matches": 2, "successful": 2, "failed": 0}});
        let summary = delete_summary(&envelope).unwrap();
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.failed, 0);
    }
}
