//! Linked account and game endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::post,
};
use gamerlink_common::{AppError, AppResult};
use gamerlink_core::{ConnectGameInput, LinkedAccount};
use serde::Deserialize;

use crate::{
    extractors::{ApiJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Handle for a linked account. Each platform reads its own field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAccountRequest {
    pub twitch_username: Option<String>,
    pub discord_username: Option<String>,
    pub instagram_handle: Option<String>,
    pub youtube_channel: Option<String>,
}

impl ConnectAccountRequest {
    fn handle_for(self, kind: LinkedAccount) -> Option<String> {
        match kind {
            LinkedAccount::Twitch => self.twitch_username,
            LinkedAccount::Discord => self.discord_username,
            LinkedAccount::Instagram => self.instagram_handle,
            LinkedAccount::Youtube => self.youtube_channel,
        }
    }
}

fn parse_platform(platform: &str) -> AppResult<LinkedAccount> {
    LinkedAccount::from_slug(platform)
        .ok_or_else(|| AppError::NotFound(format!("Unknown platform: {platform}")))
}

const fn noun(kind: LinkedAccount) -> &'static str {
    match kind {
        LinkedAccount::Youtube => "channel",
        _ => "account",
    }
}

/// Link an external account.
async fn connect_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(platform): Path<String>,
    ApiJson(req): ApiJson<ConnectAccountRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let kind = parse_platform(&platform)?;
    let handle = req.handle_for(kind).unwrap_or_default();

    state
        .profile_service
        .connect_account(&user.id, kind, &handle)
        .await?;

    Ok(ApiResponse::ok(MessageResponse::new(format!(
        "{} {} connected successfully",
        kind.label(),
        noun(kind)
    ))))
}

/// Unlink an external account.
async fn disconnect_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let kind = parse_platform(&platform)?;

    state
        .profile_service
        .disconnect_account(&user.id, kind)
        .await?;

    Ok(ApiResponse::ok(MessageResponse::new(format!(
        "{} {} disconnected successfully",
        kind.label(),
        noun(kind)
    ))))
}

/// Connect a game or update its details.
async fn connect_game(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ConnectGameInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.profile_service.connect_game(&user.id, req).await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Game connected successfully",
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectGameRequest {
    pub game_name: String,
}

/// Disconnect a game.
async fn disconnect_game(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DisconnectGameRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state
        .profile_service
        .disconnect_game(&user.id, &req.game_name)
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Game disconnected successfully",
    )))
}

pub fn router() -> Router<AppState> {
    // Static game routes take precedence over the `{platform}` captures.
    Router::new()
        .route("/connect/game", post(connect_game))
        .route("/disconnect/game", post(disconnect_game))
        .route("/connect/{platform}", post(connect_account))
        .route("/disconnect/{platform}", post(disconnect_account))
}
