//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gamerlink_core::FollowState;
use serde::Serialize;

/// Standard API response wrapper: a JSON body with a success status.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    body: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a `200 OK` response.
    pub const fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Create a `201 Created` response.
    pub const fn created(body: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// A bare acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a follow transition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStateResponse {
    pub follow_state: FollowState,
    pub message: String,
}

impl FollowStateResponse {
    pub fn new(follow_state: FollowState, message: impl Into<String>) -> Self {
        Self {
            follow_state,
            message: message.into(),
        }
    }
}
