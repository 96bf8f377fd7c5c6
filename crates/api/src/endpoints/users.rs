//! User and profile endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use gamerlink_common::AppResult;
use gamerlink_core::{ProfileView, UserSummary};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{ApiJson, AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// List every user, newest first.
async fn list_users(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let users = state.profile_service.list_users().await?;
    Ok(ApiResponse::ok(users))
}

/// The caller's own profile.
async fn own_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ProfileView>> {
    let profile = state.profile_service.get_own_profile(&user.id).await?;
    Ok(ApiResponse::ok(profile))
}

/// Someone's profile. Signed-in viewers also get their follow state.
async fn show_profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ProfileView>> {
    let profile = state
        .profile_service
        .get_public_profile(viewer.as_ref().map(|v| v.id.as_str()), &username)
        .await?;
    Ok(ApiResponse::ok(profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyRequest {
    pub is_private: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyResponse {
    pub message: &'static str,
    pub is_private: bool,
}

/// Make the caller's account private or public.
async fn update_privacy(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PrivacyRequest>,
) -> AppResult<ApiResponse<PrivacyResponse>> {
    let is_private = state
        .profile_service
        .update_privacy(&user.id, req.is_private)
        .await?;

    Ok(ApiResponse::ok(PrivacyResponse {
        message: "Privacy settings updated",
        is_private,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/profile", get(own_profile))
        .route("/profile/{username}", get(show_profile))
        .route("/privacy", post(update_privacy))
}
