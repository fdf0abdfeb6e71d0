// HTTP surface: route assembly for the public catalog, auth, user lists
// and the admin console.

pub mod error;

mod admin;
mod auth;
mod catalog;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/auth", auth::routes())
        .nest("/api/user", users::routes())
        .nest("/api/admin", admin::routes())
        .nest("/api", catalog::routes())
}
