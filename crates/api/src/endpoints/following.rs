//! Following endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use gamerlink_common::AppResult;
use gamerlink_core::{FollowState, PendingFollowRequest};
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, FollowStateResponse},
};

/// Follow a user, or ask to if their account is private.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowStateResponse>> {
    let follow_state = state.following_service.follow(&user, &username).await?;

    let message = match follow_state {
        FollowState::Requested => "Follow request sent",
        _ => "Successfully followed user",
    };

    Ok(ApiResponse::ok(FollowStateResponse::new(
        follow_state,
        message,
    )))
}

/// Stop following a user, withdrawing any request.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowStateResponse>> {
    let follow_state = state.following_service.unfollow(&user, &username).await?;

    Ok(ApiResponse::ok(FollowStateResponse::new(
        follow_state,
        "Successfully unfollowed user",
    )))
}

/// Follow state response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusResponse {
    pub follow_state: FollowState,
    pub is_following: bool,
    pub followers_count: u64,
    pub message: &'static str,
}

const fn describe(follow_state: FollowState) -> &'static str {
    match follow_state {
        FollowState::Following => "You are following this user",
        FollowState::Requested => "Follow request pending",
        FollowState::NotFollowing => "You are not following this user",
        FollowState::Own => "This is your own profile",
    }
}

/// The caller's relationship toward a user.
async fn follow_state(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowStatusResponse>> {
    let status = state
        .following_service
        .get_follow_state(Some(&user), &username)
        .await?;

    Ok(ApiResponse::ok(FollowStatusResponse {
        follow_state: status.state,
        is_following: status.state == FollowState::Following,
        followers_count: status.followers_count,
        message: describe(status.state),
    }))
}

/// Accept a pending request from `username`.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowStateResponse>> {
    let follow_state = state
        .following_service
        .accept_request(&user, &username)
        .await?;

    Ok(ApiResponse::ok(FollowStateResponse::new(
        follow_state,
        "Follow request accepted",
    )))
}

/// Reject a pending request from `username`.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowStateResponse>> {
    let follow_state = state
        .following_service
        .reject_request(&user, &username)
        .await?;

    Ok(ApiResponse::ok(FollowStateResponse::new(
        follow_state,
        "Follow request rejected",
    )))
}

/// Pending requests response.
#[derive(Serialize)]
pub struct PendingRequestsResponse {
    pub requests: Vec<PendingFollowRequest>,
}

/// Requests waiting for the caller's decision, newest first.
async fn pending_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PendingRequestsResponse>> {
    let requests = state.following_service.list_pending_requests(&user).await?;
    Ok(ApiResponse::ok(PendingRequestsResponse { requests }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/{username}", post(follow))
        .route("/unfollow/{username}", post(unfollow))
        .route("/api/follow/state/{username}", get(follow_state))
        .route("/api/follow/accept/{username}", post(accept))
        .route("/api/follow/reject/{username}", post(reject))
        .route("/api/follow/requests", get(pending_requests))
}
