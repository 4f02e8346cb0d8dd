use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::{Document, IngestionBatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChapterQuery {
    pub chapter_name: String,
}

pub async fn create_vectors(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<IngestionBatch>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.pipeline.ingest(&batch).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_object_id(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChapterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.chapter_name.trim().is_empty() {
        return Err(ApiError::BadRequest("chapter_name must not be empty".to_string()));
    }
    let id = state.pipeline.object_id_for_chapter(&query.chapter_name).await?;
    Ok(Json(id))
}

pub async fn delete_object(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.pipeline.delete_object(&id).await?;
    Ok(Json(message))
}

pub async fn update_object(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(document): Json<Document>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.pipeline.update_object(&id, &document).await?;
    Ok(Json(message))
}

pub async fn delete_chapter(
    State(state): State<Arc<AppState>>,
    Path(chapter): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.pipeline.delete_chapter(&chapter).await?;
    Ok(Json(message))
}
