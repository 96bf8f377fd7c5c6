//! Profile service: privacy, linked accounts and connected games.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use gamerlink_common::{AppError, AppResult, IdGenerator};
use gamerlink_db::{
    entities::{user, user_game, user_profile},
    repositories::{FollowingRepository, UserGameRepository, UserProfileRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::following::{FollowState, FollowingService};

const MAX_HANDLE_LEN: usize = 255;

/// An external account that can be linked to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedAccount {
    Twitch,
    Discord,
    Instagram,
    Youtube,
}

impl LinkedAccount {
    /// Every kind, in display order.
    pub const ALL: [Self; 4] = [Self::Twitch, Self::Discord, Self::Instagram, Self::Youtube];

    /// Path segment used by the connect/disconnect routes.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Twitch => "twitch",
            Self::Discord => "discord",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
        }
    }

    /// Human-readable platform name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Twitch => "Twitch",
            Self::Discord => "Discord",
            Self::Instagram => "Instagram",
            Self::Youtube => "YouTube",
        }
    }

    /// Parse a route slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    const fn column(self) -> user_profile::Column {
        match self {
            Self::Twitch => user_profile::Column::TwitchUsername,
            Self::Discord => user_profile::Column::DiscordUsername,
            Self::Instagram => user_profile::Column::InstagramHandle,
            Self::Youtube => user_profile::Column::YoutubeChannel,
        }
    }
}

/// Handles linked to a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccounts {
    pub twitch_username: Option<String>,
    pub discord_username: Option<String>,
    pub instagram_handle: Option<String>,
    pub youtube_channel: Option<String>,
}

impl From<user_profile::Model> for LinkedAccounts {
    fn from(profile: user_profile::Model) -> Self {
        Self {
            twitch_username: profile.twitch_username,
            discord_username: profile.discord_username,
            instagram_handle: profile.instagram_handle,
            youtube_channel: profile.youtube_channel,
        }
    }
}

/// A connected game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub name: String,
    pub username: Option<String>,
    pub game_id: Option<String>,
}

impl From<user_game::Model> for GameView {
    fn from(game: user_game::Model) -> Self {
        Self {
            name: game.game_name,
            username: game.game_username,
            game_id: game.game_id,
        }
    }
}

/// A user as shown in the user list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub is_private: bool,
    #[serde(flatten)]
    pub linked_accounts: LinkedAccounts,
    pub connected_games: Vec<String>,
    pub created_at: DateTimeWithTimeZone,
}

/// A full profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
    pub username: String,
    pub is_private: bool,
    #[serde(flatten)]
    pub linked_accounts: LinkedAccounts,
    pub connected_games: Vec<String>,
    pub games: Vec<GameView>,
    pub followers_count: u64,
    pub following_count: u64,
    pub created_at: DateTimeWithTimeZone,
    /// Set when the profile is viewed by someone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_state: Option<FollowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

/// Input for connecting a game.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConnectGameInput {
    #[validate(length(min = 1, max = 255, message = "Game name must be 1-255 characters"))]
    pub game_name: String,

    #[validate(length(max = 255))]
    pub game_username: Option<String>,

    #[validate(length(max = 255))]
    pub game_id: Option<String>,
}

impl ConnectGameInput {
    fn normalized(self) -> Self {
        Self {
            game_name: self.game_name.trim().to_string(),
            game_username: non_blank(self.game_username),
            game_id: non_blank(self.game_id),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Profile service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    game_repo: UserGameRepository,
    following_repo: FollowingRepository,
    following_service: FollowingService,
    id_gen: IdGenerator,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        game_repo: UserGameRepository,
        following_repo: FollowingRepository,
        following_service: FollowingService,
    ) -> Self {
        Self {
            db,
            user_repo,
            profile_repo,
            game_repo,
            following_repo,
            following_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// The caller's own profile.
    pub async fn get_own_profile(&self, user_id: &str) -> AppResult<ProfileView> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.build_profile(user).await
    }

    /// Someone's profile as seen by `viewer_id` (anonymous when `None`).
    pub async fn get_public_profile(
        &self,
        viewer_id: Option<&str>,
        username: &str,
    ) -> AppResult<ProfileView> {
        let user = self.user_repo.get_by_username(username).await?;
        let status = self.following_service.follow_status(viewer_id, &user).await?;

        let mut profile = self.build_profile(user).await?;
        profile.followers_count = status.followers_count;
        if viewer_id.is_some() {
            profile.follow_state = Some(status.state);
            profile.is_following = Some(status.state == FollowState::Following);
        }

        Ok(profile)
    }

    /// Every user, newest first.
    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        let users = self.user_repo.find_all().await?;
        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();

        let mut profiles: HashMap<String, user_profile::Model> = self
            .profile_repo
            .find_by_user_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect();

        let mut games: HashMap<String, Vec<String>> = HashMap::new();
        for game in self.game_repo.find_by_user_ids(&ids).await? {
            games.entry(game.user_id).or_default().push(game.game_name);
        }

        Ok(users
            .into_iter()
            .map(|u| UserSummary {
                linked_accounts: profiles.remove(&u.id).map(Into::into).unwrap_or_default(),
                connected_games: games.remove(&u.id).unwrap_or_default(),
                id: u.id,
                username: u.username,
                is_private: u.is_private,
                created_at: u.created_at,
            })
            .collect())
    }

    /// Make the account private or public. Returns the new flag.
    ///
    /// Pending requests are kept when an account goes public.
    pub async fn update_privacy(&self, user_id: &str, is_private: bool) -> AppResult<bool> {
        if !self.user_repo.set_private(user_id, is_private).await? {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        tracing::info!(user_id = %user_id, is_private, "Updated privacy");
        Ok(is_private)
    }

    /// Link an external account. Replaces any previous handle for that platform.
    pub async fn connect_account(
        &self,
        user_id: &str,
        kind: LinkedAccount,
        handle: &str,
    ) -> AppResult<()> {
        let handle = handle.trim();
        if handle.is_empty() || handle.chars().count() > MAX_HANDLE_LEN {
            return Err(AppError::Validation(format!(
                "{} handle must be 1-{MAX_HANDLE_LEN} characters",
                kind.label()
            )));
        }

        self.set_handle(user_id, kind, Some(handle.to_string()))
            .await
    }

    /// Unlink an external account. Unlinking twice is fine.
    pub async fn disconnect_account(&self, user_id: &str, kind: LinkedAccount) -> AppResult<()> {
        self.set_handle(user_id, kind, None).await
    }

    /// Connect a game, or refresh its in-game name and ID.
    pub async fn connect_game(&self, user_id: &str, input: ConnectGameInput) -> AppResult<()> {
        let input = input.normalized();
        input.validate()?;

        self.game_repo
            .upsert(user_game::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                game_name: Set(input.game_name.clone()),
                game_username: Set(input.game_username),
                game_id: Set(input.game_id),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        tracing::debug!(user_id = %user_id, game = %input.game_name, "Connected game");
        Ok(())
    }

    /// Disconnect a game. Disconnecting a game that is not connected is fine.
    pub async fn disconnect_game(&self, user_id: &str, game_name: &str) -> AppResult<()> {
        let game_name = game_name.trim();
        if game_name.is_empty() {
            return Err(AppError::Validation("Game name is required".to_string()));
        }

        self.game_repo.delete_by_name(user_id, game_name).await?;
        Ok(())
    }

    async fn set_handle(
        &self,
        user_id: &str,
        kind: LinkedAccount,
        handle: Option<String>,
    ) -> AppResult<()> {
        if !self
            .profile_repo
            .set_handle(user_id, kind.column(), handle)
            .await?
        {
            return Err(AppError::NotFound(format!("Profile for user {user_id}")));
        }
        Ok(())
    }

    async fn build_profile(&self, user: user::Model) -> AppResult<ProfileView> {
        let linked_accounts = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .map(Into::into)
            .unwrap_or_default();

        let games: Vec<GameView> = self
            .game_repo
            .find_by_user_id(&user.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let followers_count = self
            .following_repo
            .count_followers(self.db.as_ref(), &user.id)
            .await?;
        let following_count = self
            .following_repo
            .count_following(self.db.as_ref(), &user.id)
            .await?;

        Ok(ProfileView {
            id: user.id,
            username: user.username,
            is_private: user.is_private,
            linked_accounts,
            connected_games: games.iter().map(|g| g.name.clone()).collect(),
            games,
            followers_count,
            following_count,
            created_at: user.created_at,
            follow_state: None,
            is_following: None,
        })
    }
}
