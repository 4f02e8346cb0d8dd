use std::collections::HashSet;
use std::sync::Arc;

use super::locks::ChapterLocks;
use super::parse::{self, ParseError};
use super::store::{Selection, VectorIndex};
use super::types::{Document, IngestionBatch, IngestionReceipt, ObjectId, OperationMessage};
use crate::core::errors::RagError;

/// Similarity threshold for nearest-neighbour retrieval.
pub const MAX_DISTANCE: f32 = 0.5;
/// Maximum number of hits requested per retrieval.
pub const RESULT_LIMIT: usize = 5;

/// Chapter-level operations over a `VectorIndex`.
///
/// Chapter is a natural key layered over the index's opaque identifiers, so
/// every chapter-keyed mutation does a lookup round trip first. Those
/// check-then-act sequences run under a per-chapter lock.
#[derive(Clone)]
pub struct VectorGateway {
    index: Arc<dyn VectorIndex>,
    locks: Arc<ChapterLocks>,
}

impl VectorGateway {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            index,
            locks: Arc::new(ChapterLocks::new()),
        }
    }

    fn items<'a>(
        &self,
        envelope: &'a serde_json::Value,
        context: &str,
    ) -> Result<&'a [serde_json::Value], RagError> {
        parse::class_items(envelope, self.index.class_name()).map_err(|e| e.into_rag(context))
    }

    /// Whether at least one object carries exactly this chapter.
    pub async fn chapter_exists(&self, chapter: &str) -> Result<bool, RagError> {
        let context = format!("check chapter {}", chapter);
        let envelope = self
            .index
            .find_by_chapter(chapter, Selection::Chapter, Some(1))
            .await?;
        Ok(!self.items(&envelope, &context)?.is_empty())
    }

    /// Insert every document of the batch, or none of them.
    ///
    /// Fails with `AlreadyExists` if any chapter is already indexed or
    /// appears twice in the batch; no insert call is issued in that case.
    #[tracing::instrument(skip(self, batch), fields(owner = %batch.owner_id, documents = batch.documents.len()))]
    pub async fn create_vectors(&self, batch: &IngestionBatch) -> Result<IngestionReceipt, RagError> {
        if batch.documents.is_empty() {
            return Err(RagError::ValidationFailed(
                "ingestion batch contains no documents".to_string(),
            ));
        }
        if let Some(doc) = batch.documents.iter().find(|d| d.chapter.trim().is_empty()) {
            return Err(RagError::ValidationFailed(format!(
                "document with {} subsections has an empty chapter name",
                doc.subsections.len()
            )));
        }

        let _guard = self
            .locks
            .acquire(batch.documents.iter().map(|d| d.chapter.as_str()))
            .await;

        let mut seen = HashSet::new();
        let mut objects = Vec::with_capacity(batch.documents.len());
        let mut chapters_created = Vec::with_capacity(batch.documents.len());

        for doc in &batch.documents {
            if !seen.insert(doc.chapter.as_str()) {
                tracing::warn!(chapter = %doc.chapter, "chapter repeated within batch");
                return Err(RagError::AlreadyExists(format!(
                    "chapter {} appears more than once in the batch",
                    doc.chapter
                )));
            }
            if self.chapter_exists(&doc.chapter).await? {
                tracing::warn!(chapter = %doc.chapter, "chapter already exists in index");
                return Err(RagError::AlreadyExists(format!(
                    "chapter {} already exists",
                    doc.chapter
                )));
            }
            objects.push(doc.to_properties());
            chapters_created.push(doc.chapter.clone());
        }

        let results = self.index.create_batch(objects).await?;
        let errors = parse::batch_errors(&results);
        if !errors.is_empty() {
            return Err(RagError::QueryFailed(format!(
                "batch insert: {}",
                errors.join(", ")
            )));
        }

        tracing::info!(chapters = ?chapters_created, "chapters ingested");
        Ok(IngestionReceipt { chapters_created })
    }

    /// Nearest-neighbour search, merged to one document per chapter.
    #[tracing::instrument(skip(self))]
    pub async fn get_closest_vectors(&self, query: &str) -> Result<Vec<Document>, RagError> {
        let envelope = self.index.near_text(query, MAX_DISTANCE, RESULT_LIMIT).await?;
        let items = self.items(&envelope, "near text search")?;
        if items.is_empty() {
            return Err(RagError::NotFound(format!(
                "no documents close to query: {}",
                query
            )));
        }

        let documents = parse::merge_by_chapter(items)
            .map_err(|e| e.into_rag("near text search"))?;
        tracing::debug!(hits = items.len(), chapters = documents.len(), "retrieval merged");
        Ok(documents)
    }

    pub async fn get_object_id_by_chapter(&self, chapter: &str) -> Result<ObjectId, RagError> {
        let context = format!("lookup chapter {}", chapter);
        let envelope = self
            .index
            .find_by_chapter(chapter, Selection::Id, None)
            .await?;
        let items = self.items(&envelope, &context)?;
        match parse::first_id(items).map_err(|e: ParseError| e.into_rag(&context))? {
            Some(id) => Ok(ObjectId { id }),
            None => Err(RagError::NotFound(format!(
                "no object found for chapter: {}",
                chapter
            ))),
        }
    }

    /// Read-before-write. An absent object is `NotFound`; a failed read is
    /// passed through as the upstream error it is.
    async fn require_object(&self, id: &str, action: &str) -> Result<serde_json::Value, RagError> {
        match self.index.get_object(id).await? {
            Some(object) => Ok(object),
            None => Err(RagError::NotFound(format!(
                "cannot {} object with id {}, it does not exist",
                action, id
            ))),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_object_by_id(&self, id: &str) -> Result<OperationMessage, RagError> {
        self.require_object(id, "delete").await?;
        self.index.delete_object(id).await?;
        tracing::info!(id, "object deleted");
        Ok(OperationMessage::new("Object deleted successfully"))
    }

    /// Replace the object's properties wholesale with `document`.
    ///
    /// Moving an object to another chapter is only allowed while that chapter
    /// is unused; both chapters stay locked until the write is done.
    #[tracing::instrument(skip(self, document), fields(chapter = %document.chapter))]
    pub async fn update_object_by_id(
        &self,
        document: &Document,
        id: &str,
    ) -> Result<OperationMessage, RagError> {
        if document.chapter.trim().is_empty() {
            return Err(RagError::ValidationFailed(format!(
                "cannot update object with id {} to an empty chapter name",
                id
            )));
        }

        let stored = self.require_object(id, "update").await?;
        let current = stored
            .get("properties")
            .and_then(|p| p.get("chapter"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        let _guard = self
            .locks
            .acquire([current.as_str(), document.chapter.as_str()])
            .await;

        if current != document.chapter && self.chapter_exists(&document.chapter).await? {
            return Err(RagError::AlreadyExists(format!(
                "cannot move object {} to chapter {}, chapter already exists",
                id, document.chapter
            )));
        }

        self.index.replace_object(id, document.to_properties()).await?;
        tracing::info!(id, from = %current, "object updated");
        Ok(OperationMessage::new("Object updated successfully"))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_chapter(&self, chapter: &str) -> Result<OperationMessage, RagError> {
        let _guard = self.locks.acquire([chapter]).await;

        if !self.chapter_exists(chapter).await? {
            return Err(RagError::NotFound(format!(
                "cannot delete chapter, chapter {} does not exist",
                chapter
            )));
        }

        let context = format!("delete chapter {}", chapter);
        let envelope = self.index.delete_where_chapter(chapter).await?;
        let summary = parse::delete_summary(&envelope).map_err(|e| e.into_rag(&context))?;
        if summary.failed > 0 {
            tracing::warn!(chapter, failed = summary.failed, "partial chapter delete");
            return Err(RagError::QueryFailed(format!(
                "{}: matched {} objects, deleted {}, failed {}",
                context, summary.matched, summary.deleted, summary.failed
            )));
        }

        Ok(OperationMessage::new(format!(
            "matched {} objects, deleted {}, failed {}",
            summary.matched, summary.deleted, summary.failed
        )))
    }
}
