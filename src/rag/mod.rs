//! RAG (Retrieval-Augmented Generation) index access.
//!
//! This module provides:
//! - `VectorIndex`: transport seam to the external vector search service
//! - `WeaviateIndex`: the REST/GraphQL implementation of that seam
//! - `VectorGateway`: chapter-keyed ingestion, retrieval and maintenance

mod gateway;
mod locks;
mod parse;
mod store;
mod types;
mod weaviate;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::{VectorGateway, MAX_DISTANCE, RESULT_LIMIT};
pub use store::{Selection, VectorIndex};
pub use types::{
    BatchDeleteSummary, Document, IngestionBatch, IngestionReceipt, ObjectId, OperationMessage,
    Subsection,
};
pub use weaviate::WeaviateIndex;
