pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::document::handlers as document;
use crate::optimize::handlers as optimize;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/upload",
            post(document::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/optimize", post(optimize::handle_optimize))
        .route("/generate-docx", post(document::handle_generate_docx))
        .with_state(state)
}
