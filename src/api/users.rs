// User profile, watchlist and continue-watching endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::models::{User, WatchItem};
use crate::{services, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/update", put(update_profile))
        .route("/watchlist", post(watchlist_add))
        .route("/watchlist/remove", post(watchlist_remove))
        .route("/history", post(history_add))
        .route("/history/remove", post(history_remove))
        .route("/:email", get(get_user))
}

/// Full user document as the client sees it: identity plus both lists,
/// never any password material
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub watchlist: Vec<WatchItem>,
    pub continue_watching: Vec<WatchItem>,
}

pub async fn load_user_doc(pool: &SqlitePool, user: User) -> Result<UserDoc, ApiError> {
    let watchlist = services::users::watchlist(pool, &user.id).await?;
    let continue_watching = services::users::history(pool, &user.id).await?;
    Ok(UserDoc {
        id: user.id,
        email: user.email,
        username: user.username,
        role: user.role,
        watchlist,
        continue_watching,
    })
}

async fn require_user(pool: &SqlitePool, email: &str) -> Result<User, ApiError> {
    services::users::find_by_email(pool, email)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

/// GET /api/user/:email
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<UserDoc>, ApiError> {
    let user = require_user(&state.db, &email).await?;
    Ok(Json(load_user_doc(&state.db, user).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    email: String,
    new_username: Option<String>,
    new_password: Option<String>,
}

/// PUT /api/user/update
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let password_hash = req
        .new_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(services::auth::hash_password)
        .transpose()?;

    let updated = services::users::update_profile(
        &state.db,
        &req.email,
        req.new_username.as_deref().filter(|u| !u.is_empty()),
        password_hash.as_deref(),
    )
    .await?;

    if !updated {
        return Err(ApiError::not_found("User"));
    }
    Ok(Json(json!({ "message": "Updated" })))
}

#[derive(Debug, Deserialize)]
struct ListRequest {
    email: String,
    item: WatchItem,
}

/// POST /api/user/watchlist
async fn watchlist_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListRequest>,
) -> Result<Json<Vec<WatchItem>>, ApiError> {
    let user = require_user(&state.db, &req.email).await?;
    let list = services::users::add_to_watchlist(&state.db, &user.id, &req.item).await?;
    Ok(Json(list))
}

/// POST /api/user/watchlist/remove
async fn watchlist_remove(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListRequest>,
) -> Result<Json<Vec<WatchItem>>, ApiError> {
    let user = require_user(&state.db, &req.email).await?;
    let list = services::users::remove_from_watchlist(&state.db, &user.id, req.item.id).await?;
    Ok(Json(list))
}

/// POST /api/user/history
async fn history_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListRequest>,
) -> Result<Json<Vec<WatchItem>>, ApiError> {
    let user = require_user(&state.db, &req.email).await?;
    let list = services::users::record_history(&state.db, &user.id, &req.item).await?;
    Ok(Json(list))
}

/// POST /api/user/history/remove
async fn history_remove(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListRequest>,
) -> Result<Json<Vec<WatchItem>>, ApiError> {
    let user = require_user(&state.db, &req.email).await?;
    let list = services::users::remove_from_history(&state.db, &user.id, req.item.id).await?;
    Ok(Json(list))
}
