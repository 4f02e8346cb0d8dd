use serde::{Deserialize, Serialize};

/// Atomic retrievable unit of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsection {
    pub title: String,
    pub content: String,
}

/// A chapter and its subsections. The chapter is the unique grouping key
/// within the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub chapter: String,
    #[serde(default)]
    pub subsections: Vec<Subsection>,
}

impl Document {
    pub fn new(chapter: impl Into<String>, subsections: Vec<Subsection>) -> Self {
        Self {
            chapter: chapter.into(),
            subsections,
        }
    }

    /// Property map stored on the index object.
    pub fn to_properties(&self) -> serde_json::Value {
        serde_json::json!({
            "chapter": self.chapter,
            "subsections": self.subsections,
        })
    }
}

/// One ingestion request. Each document is checked independently but all of
/// them are submitted to the index in a single batched call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionBatch {
    #[serde(alias = "user_id")]
    pub owner_id: String,
    #[serde(alias = "document")]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReceipt {
    #[serde(rename = "list_of_chapters_created")]
    pub chapters_created: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectId {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMessage {
    pub message: String,
}

impl OperationMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a filtered batch delete as reported by the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchDeleteSummary {
    pub matched: u64,
    pub deleted: u64,
    pub failed: u64,
}
