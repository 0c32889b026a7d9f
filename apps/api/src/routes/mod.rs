pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

/// Resumes are uploaded whole; allow more than axum's 2 MiB default.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/interviews", post(handlers::handle_create_interview))
        .route("/api/v1/interviews/:id", get(handlers::handle_get_interview))
        .route(
            "/api/v1/interviews/:id/start",
            post(handlers::handle_start_interview),
        )
        .route(
            "/api/v1/interviews/:id/messages",
            post(handlers::handle_send_message),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
