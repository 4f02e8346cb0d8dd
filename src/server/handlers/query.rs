use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::chain::QueryRequest;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
    pub user_message: String,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Session key precedence: `X-Session-ID`, `X-User-ID`, body `user_id`, then
/// a fresh session. The session id used is echoed back in `X-Session-ID`.
fn resolve_session(headers: &HeaderMap, user_id: &str) -> String {
    header_value(headers, SESSION_HEADER)
        .or_else(|| header_value(headers, USER_HEADER))
        .or_else(|| Some(user_id.trim().to_string()).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(query): Json<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = resolve_session(&headers, &query.user_id);
    let answer = state
        .pipeline
        .ask(QueryRequest {
            session_id: session_id.clone(),
            raw_question: query.user_message,
        })
        .await?;

    let session_value = HeaderValue::from_str(&session_id).map_err(ApiError::internal)?;
    Ok((
        [(HeaderName::from_static(SESSION_HEADER), session_value)],
        Json(answer),
    ))
}
