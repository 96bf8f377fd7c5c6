//! User service: accounts, credentials and session tokens.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use gamerlink_common::{AppError, AppResult, IdGenerator, SessionKeys};
use gamerlink_db::{
    entities::{user, user_profile},
    repositories::{UserProfileRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    session_keys: SessionKeys,
    id_gen: IdGenerator,
}

/// The account behind a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
}

/// Credentials submitted to register or log in.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsInput {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
}

impl CredentialsInput {
    fn trimmed(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            password: self.password.trim().to_string(),
        }
    }
}

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub username: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        session_keys: SessionKeys,
    ) -> Self {
        Self {
            db,
            user_repo,
            profile_repo,
            session_keys,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    ///
    /// The account and its empty profile are created in one transaction.
    pub async fn register(&self, input: CredentialsInput) -> AppResult<user::Model> {
        let input = input.trimmed();
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let now = Utc::now();

        let txn = gamerlink_db::begin(&self.db).await?;

        let user = self
            .user_repo
            .create(
                &txn,
                user::ActiveModel {
                    id: Set(user_id.clone()),
                    username: Set(input.username),
                    password_hash: Set(password_hash),
                    is_private: Set(false),
                    created_at: Set(now.into()),
                    updated_at: Set(None),
                },
            )
            .await?;

        self.profile_repo
            .create(
                &txn,
                user_profile::ActiveModel {
                    user_id: Set(user_id),
                    twitch_username: Set(None),
                    discord_username: Set(None),
                    instagram_handle: Set(None),
                    youtube_channel: Set(None),
                    updated_at: Set(None),
                },
            )
            .await?;

        gamerlink_db::commit(txn).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Check credentials and issue a session token.
    pub async fn login(&self, input: CredentialsInput) -> AppResult<LoginOutput> {
        let input = input.trimmed();

        let Some(user) = self.user_repo.find_by_username(&input.username).await? else {
            tracing::debug!(username = %input.username, "Login for unknown user");
            return Err(AppError::Unauthorized);
        };

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::Unauthorized);
        }

        let token = self.session_keys.issue(&user.username)?;

        Ok(LoginOutput {
            token,
            username: user.username,
        })
    }

    /// Resolve a bearer token to the account it was issued for.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<SessionUser> {
        let claims = self.session_keys.verify(token)?;

        let user = self
            .user_repo
            .find_by_username(&claims.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(SessionUser {
            id: user.id,
            username: user.username,
        })
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
