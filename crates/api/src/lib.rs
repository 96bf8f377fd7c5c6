//! HTTP API layer for gamerlink.
//!
//! This crate provides the JSON REST API:
//!
//! - **Endpoints**: accounts, profiles, linked accounts, games, follows
//! - **Extractors**: bearer authentication and JSON bodies with JSON errors
//! - **Middleware**: token resolution into request extensions
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::Router;

pub use endpoints::router;
pub use middleware::AppState;

/// The API router with authentication applied and state attached.
///
/// Transport concerns (tracing, CORS, timeouts) are layered on by the server.
pub fn app(state: AppState) -> Router {
    router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}
