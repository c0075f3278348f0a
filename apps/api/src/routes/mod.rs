pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::highlight::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_document_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Highlight API
        .route("/api/v1/highlight", post(handlers::handle_highlight))
        .route(
            "/api/v1/highlight/cache",
            get(handlers::handle_cache_stats).delete(handlers::handle_clear_cache),
        )
        .route("/api/v1/normalize", post(handlers::handle_normalize))
        .route("/api/v1/selection", post(handlers::handle_selection))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
