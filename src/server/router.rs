use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::ServerConfig;
use crate::server::handlers::{health, query, sessions, vectors};
use crate::state::AppState;

/// Creates the application router with CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.server);
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/status", get(health::get_status))
        .route("/v1/vector-db", post(vectors::create_vectors))
        .route("/v1/vector-db/object", get(vectors::get_object_id))
        .route(
            "/v1/vector-db/object/:id",
            delete(vectors::delete_object).patch(vectors::update_object),
        )
        .route("/v1/vector-db/chapter/:chapter", delete(vectors::delete_chapter))
        .route("/v1/query", post(query::ask))
        .route("/v1/sessions/:session_id", delete(sessions::clear_session))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(config)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static(query::SESSION_HEADER),
            HeaderName::from_static(query::USER_HEADER),
        ])
        .expose_headers([HeaderName::from_static(query::SESSION_HEADER)])
}

fn resolve_allowed_origins(config: &ServerConfig) -> Vec<String> {
    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }

    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}
