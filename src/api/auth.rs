// Auth endpoints: signup and login.
//
// There is no server-side session: login hands the full user document
// (lists included) to the client, which keeps it in local storage. Logout
// is a pure client-side state clear and never reaches the server.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::users::load_user_doc;
use crate::{services, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/signup
/// Creates a user with role "user"; username is the email's local part
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let existing = services::users::find_by_email(&state.db, &req.email).await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let username = req.email.split('@').next().unwrap_or(&req.email).to_string();
    services::auth::create_user(&state.db, &req.email, &username, &req.password, "user").await?;

    tracing::info!("Created user account for {}", req.email);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Created", "user": { "email": req.email } })),
    ))
}

/// POST /api/auth/login
/// Exact email + password check; success returns the full user document
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = services::auth::authenticate(&state.db, &req.email, &req.password)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let doc = load_user_doc(&state.db, user).await?;
    Ok(Json(json!({ "message": "Success", "user": doc })))
}
