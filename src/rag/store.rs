//! VectorIndex trait: the transport seam to the external vector search
//! service.
//!
//! Implementations speak the wire protocol and hand back the service's raw
//! JSON envelopes. Interpreting those envelopes is the gateway's job (see
//! `parse`), so nothing untyped escapes `rag`.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::errors::RagError;

/// Which properties a chapter-filtered lookup should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Only the `chapter` property.
    Chapter,
    /// Only the object identifier (`_additional { id }`).
    Id,
    /// `chapter` plus `subsections { title content }`.
    Document,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the index class holding chapter objects.
    fn class_name(&self) -> &str;

    /// Exact-match lookup on the chapter property. Returns the GraphQL
    /// envelope (`{"data": {"Get": {<class>: [...]}}}`).
    async fn find_by_chapter(
        &self,
        chapter: &str,
        selection: Selection,
        limit: Option<usize>,
    ) -> Result<Value, RagError>;

    /// Similarity search with the query text as the only concept.
    async fn near_text(
        &self,
        query: &str,
        max_distance: f32,
        limit: usize,
    ) -> Result<Value, RagError>;

    /// Insert all objects in one call. Returns the per-object results in
    /// submission order.
    async fn create_batch(&self, objects: Vec<Value>) -> Result<Vec<Value>, RagError>;

    /// Read an object by identifier. `Ok(None)` means the service reported
    /// the object as absent; any other failure is an error.
    async fn get_object(&self, id: &str) -> Result<Option<Value>, RagError>;

    /// Replace all properties of an object.
    async fn replace_object(&self, id: &str, properties: Value) -> Result<(), RagError>;

    async fn delete_object(&self, id: &str) -> Result<(), RagError>;

    /// Delete every object whose chapter equals `chapter`. Returns the
    /// service's summary envelope.
    async fn delete_where_chapter(&self, chapter: &str) -> Result<Value, RagError>;
}
