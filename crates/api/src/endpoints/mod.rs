//! API endpoints.

mod auth;
mod connections;
mod following;
mod users;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(users::router())
        .merge(connections::router())
        .merge(following::router())
}

/// Liveness check.
async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
