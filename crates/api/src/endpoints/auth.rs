//! Authentication endpoints.

use axum::{Router, extract::State, routing::post};
use gamerlink_common::AppResult;
use gamerlink_core::CredentialsInput;
use serde::Serialize;

use crate::{extractors::ApiJson, middleware::AppState, response::ApiResponse};

/// Register response.
#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub username: String,
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let user = state.user_service.register(req).await?;

    Ok(ApiResponse::created(RegisterResponse {
        message: "User created successfully",
        username: user.username,
    }))
}

/// Login response.
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub message: &'static str,
}

/// Exchange credentials for a bearer token.
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsInput>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let session = state.user_service.login(req).await?;

    Ok(ApiResponse::ok(LoginResponse {
        token: session.token,
        username: session.username,
        message: "Login successful",
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
