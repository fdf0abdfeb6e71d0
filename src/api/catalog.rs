// Public catalog endpoints: per-category listings, the hero carousel, and
// the view-count increment fired when playback starts.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::models::{Banner, ContentDto};
use crate::{services, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/series", get(list_series))
        .route("/anime", get(list_anime))
        .route("/carousel", get(list_carousel))
        .route("/content/view/:id", post(increment_view))
}

async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContentDto>>, ApiError> {
    Ok(Json(services::content::list_category(&state.db, "movie").await?))
}

async fn list_series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContentDto>>, ApiError> {
    Ok(Json(services::content::list_category(&state.db, "series").await?))
}

async fn list_anime(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContentDto>>, ApiError> {
    Ok(Json(services::content::list_category(&state.db, "anime").await?))
}

async fn list_carousel(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Banner>>, ApiError> {
    Ok(Json(services::content::list_banners(&state.db).await?))
}

/// POST /api/content/view/:id
/// Atomic counter bump; returns the new count
async fn increment_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let views = services::content::increment_views(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Content"))?;
    Ok(Json(json!({ "views": views })))
}
