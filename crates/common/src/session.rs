//! Session tokens.
//!
//! Bearer tokens are HS256 JWTs carrying the account's username. The keys are
//! built once at startup from [`AuthConfig`] and handed to whoever needs them.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    AppError, AppResult, IdGenerator,
    config::{AuthConfig, MAX_TOKEN_TTL_HOURS},
};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Username of the account the token was issued to.
    pub username: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    id_gen: IdGenerator,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// Create keys from a shared secret and token lifetime.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create keys from the `auth` configuration section. The lifetime is
    /// clamped to the range [`Config::validate`] accepts.
    ///
    /// [`Config::validate`]: crate::Config::validate
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::hours(config.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
        )
    }

    /// Issue a token for `username`.
    pub fn issue(&self, username: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: self.id_gen.generate_token(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {e}")))
    }

    /// Verify a token's signature and expiry and return its claims.
    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}
