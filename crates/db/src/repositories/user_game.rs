//! User game repository.

use std::sync::Arc;

use crate::entities::{UserGame, user_game};
use gamerlink_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, sea_query::OnConflict,
};

/// User game repository for database operations.
#[derive(Clone)]
pub struct UserGameRepository {
    db: Arc<DatabaseConnection>,
}

impl UserGameRepository {
    /// Create a new user game repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Games connected by a user, in the order they were connected.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Vec<user_game::Model>> {
        UserGame::find()
            .filter(user_game::Column::UserId.eq(user_id))
            .order_by_asc(user_game::Column::CreatedAt)
            .order_by_asc(user_game::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Games connected by several users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<user_game::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        UserGame::find()
            .filter(user_game::Column::UserId.is_in(user_ids.to_vec()))
            .order_by_asc(user_game::Column::CreatedAt)
            .order_by_asc(user_game::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Connect a game, or refresh the in-game name and ID if it is already connected.
    pub async fn upsert(&self, model: user_game::ActiveModel) -> AppResult<()> {
        UserGame::insert(model)
            .on_conflict(
                OnConflict::columns([user_game::Column::UserId, user_game::Column::GameName])
                    .update_columns([user_game::Column::GameUsername, user_game::Column::GameId])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Disconnect a game. Returns whether a row was removed.
    pub async fn delete_by_name(&self, user_id: &str, game_name: &str) -> AppResult<bool> {
        let result = UserGame::delete_many()
            .filter(user_game::Column::UserId.eq(user_id))
            .filter(user_game::Column::GameName.eq(game_name))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
