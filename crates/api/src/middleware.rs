//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use gamerlink_core::{FollowingService, ProfileService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub profile_service: ProfileService,
    pub following_service: FollowingService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token into a [`gamerlink_core::SessionUser`] request
/// extension. Requests without a valid token pass through anonymously;
/// handlers that need an identity reject them via the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::warn!(error = %e, "Failed to resolve bearer token");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
