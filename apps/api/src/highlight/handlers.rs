//! Axum route handlers for the Highlight API.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::highlight::cache::CacheStats;
use crate::highlight::normalizer::{is_markup, normalize};
use crate::highlight::selection::{select_term, SelectedTerm, TextSelection};
use crate::models::annotation::SkillAnnotation;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HighlightRequest {
    #[serde(default)]
    pub annotations: Vec<SkillAnnotation>,
    #[serde(default)]
    pub document: String,
}

#[derive(Debug, Serialize)]
pub struct HighlightResponse {
    pub html: String,
    pub marker_count: usize,
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    #[serde(default)]
    pub document: String,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub document: String,
    pub is_markup: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub document: String,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub annotations: Vec<SkillAnnotation>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/highlight
///
/// Returns the job description with every non-rejected skill wrapped in a marker.
/// Repeated requests with identical annotations and document are served from the cache.
pub async fn handle_highlight(
    State(state): State<AppState>,
    Json(request): Json<HighlightRequest>,
) -> Result<Json<HighlightResponse>, AppError> {
    let cache = state.highlight_cache.clone();
    // CPU-bound on large documents; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || {
        cache.compute(&request.annotations, &request.document)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("highlight task failed: {e}")))?;

    Ok(Json(HighlightResponse {
        html: result.value.html.clone(),
        marker_count: result.value.marker_count,
        cached: result.cached,
    }))
}

/// POST /api/v1/normalize
pub async fn handle_normalize(Json(request): Json<NormalizeRequest>) -> Json<NormalizeResponse> {
    let document = normalize(&request.document);
    let is_markup = is_markup(&document);
    Json(NormalizeResponse {
        document,
        is_markup,
    })
}

/// POST /api/v1/selection
///
/// Turns a `(start, end)` selection in the normalized document into a candidate skill term.
pub async fn handle_selection(
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SelectedTerm>, AppError> {
    let selection = TextSelection {
        start: request.start,
        end: request.end,
    };
    let term = select_term(&request.document, selection, &request.annotations)?;
    Ok(Json(term))
}

/// GET /api/v1/highlight/cache
pub async fn handle_cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.highlight_cache.stats())
}

/// DELETE /api/v1/highlight/cache
pub async fn handle_clear_cache(State(state): State<AppState>) -> StatusCode {
    state.highlight_cache.clear();
    StatusCode::NO_CONTENT
}
