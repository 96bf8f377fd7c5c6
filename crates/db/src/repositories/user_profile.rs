//! User profile repository.

use std::sync::Arc;

use crate::entities::{UserProfile, user_profile};
use gamerlink_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// User profile repository for database operations.
#[derive(Clone)]
pub struct UserProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl UserProfileRepository {
    /// Create a new user profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find profile by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<user_profile::Model>> {
        UserProfile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find profiles for several users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<user_profile::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        UserProfile::find()
            .filter(user_profile::Column::UserId.is_in(user_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a profile on `conn`.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: user_profile::ActiveModel,
    ) -> AppResult<user_profile::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set one linked-account column; `None` clears it.
    ///
    /// `column` must be one of the handle columns. Returns `false` if the
    /// user has no profile row.
    pub async fn set_handle(
        &self,
        user_id: &str,
        column: user_profile::Column,
        handle: Option<String>,
    ) -> AppResult<bool> {
        let result = UserProfile::update_many()
            .col_expr(column, Expr::value(handle))
            .col_expr(
                user_profile::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(chrono::Utc::now())),
            )
            .filter(user_profile::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
