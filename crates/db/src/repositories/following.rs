//! Following repository.
//!
//! Follow edges are written inside multi-statement transactions, so every
//! method takes the connection it runs on: the pool for plain reads, or a
//! [`sea_orm::DatabaseTransaction`] when composing a state transition.

use crate::entities::{Following, following};
use gamerlink_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, sea_query::OnConflict,
};

/// Following repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowingRepository;

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Find a following relationship by follower and followee.
    pub async fn find_by_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is following another user.
    pub async fn exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .find_by_pair(conn, follower_id, followee_id)
            .await?
            .is_some())
    }

    /// Insert a following relationship unless one already exists for the pair.
    ///
    /// Relies on the unique `(follower_id, followee_id)` index, so concurrent
    /// inserts for the same pair leave a single row. Returns whether a row
    /// was written.
    pub async fn insert_ignore<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: following::ActiveModel,
    ) -> AppResult<bool> {
        let inserted = Following::insert(model)
            .on_conflict(
                OnConflict::columns([
                    following::Column::FollowerId,
                    following::Column::FolloweeId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Delete a following relationship by pair. Returns whether a row was removed.
    pub async fn delete_by_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<bool> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Count followers of a user.
    pub async fn count_followers<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(user_id))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count following of a user.
    pub async fn count_following<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FollowerId.eq(user_id))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_following(id: &str, follower_id: &str, followee_id: &str) -> following::Model {
        following::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn new_edge(follower_id: &str, followee_id: &str) -> following::ActiveModel {
        following::ActiveModel {
            id: Set("f1".to_string()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let following = create_test_following("f1", "user1", "user2");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[following.clone()]])
            .into_connection();

        let repo = FollowingRepository::new();
        let result = repo.find_by_pair(&db, "user1", "user2").await.unwrap();

        assert_eq!(result, Some(following));
    }

    #[tokio::test]
    async fn test_exists_false_when_no_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<following::Model>::new()])
            .into_connection();

        let repo = FollowingRepository::new();
        assert!(!repo.exists(&db, "user1", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_ignore_reports_written_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let repo = FollowingRepository::new();
        let inserted = repo
            .insert_ignore(&db, new_edge("user1", "user2"))
            .await
            .unwrap();

        assert!(inserted);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("ON CONFLICT"));
        assert!(log.contains("DO NOTHING"));
    }

    #[tokio::test]
    async fn test_insert_ignore_duplicate_is_not_an_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = FollowingRepository::new();
        let inserted = repo
            .insert_ignore(&db, new_edge("user1", "user2"))
            .await
            .unwrap();

        assert!(!inserted);
    }

    #[tokio::test]
    async fn test_delete_by_pair_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = FollowingRepository::new();
        assert!(!repo.delete_by_pair(&db, "user1", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_count_followers() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(3)),
            }]])
            .into_connection();

        let repo = FollowingRepository::new();
        assert_eq!(repo.count_followers(&db, "user2").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_database_error_is_mapped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
            .into_connection();

        let repo = FollowingRepository::new();
        let result = repo.count_following(&db, "user1").await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
