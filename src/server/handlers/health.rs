use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Reachability of both generation backends.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (rewriter, synthesizer) = tokio::join!(
        state.rewriter_llm.health_check(),
        state.synthesizer_llm.health_check()
    );
    Json(json!({
        "status": if rewriter && synthesizer { "ok" } else { "degraded" },
        "models": {
            "rewriter": { "model": state.rewriter_llm.model(), "reachable": rewriter },
            "synthesizer": { "model": state.synthesizer_llm.model(), "reachable": synthesizer },
        },
        "memory_backend": state.config.memory.backend,
    }))
}
