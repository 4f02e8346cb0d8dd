use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::core::errors::ApiError;
use crate::rag::OperationMessage;
use crate::state::AppState;

pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.pipeline.clear_session(&session_id).await?;
    tracing::info!(session = %session_id, "conversation memory cleared");
    Ok(Json(OperationMessage::new("Session cleared")))
}
