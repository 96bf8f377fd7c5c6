//! Follow request repository.
//!
//! Like [`super::FollowingRepository`], every method takes the connection it
//! runs on so request bookkeeping can share a transaction with edge writes.

use chrono::Utc;

use crate::entities::{
    FollowRequest,
    follow_request::{self, FollowRequestStatus},
};
use gamerlink_common::{AppError, AppResult};
use sea_orm::{
    ActiveEnum, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, OnConflict},
};

/// Follow request repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowRequestRepository;

impl FollowRequestRepository {
    /// Create a new follow request repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Find a follow request by follower and followee.
    pub async fn find_by_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<follow_request::Model>> {
        FollowRequest::find()
            .filter(follow_request::Column::FollowerId.eq(follower_id))
            .filter(follow_request::Column::FolloweeId.eq(followee_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a pending follow request exists for the pair.
    pub async fn exists_pending<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .find_by_pair(conn, follower_id, followee_id)
            .await?
            .is_some_and(|r| r.status == FollowRequestStatus::Pending))
    }

    /// Insert a pending request, or re-open the pair's rejected request.
    ///
    /// Pending and accepted rows are left alone, so a pending row keeps its
    /// timestamps and an accepted one is never downgraded. Returns the number
    /// of rows written.
    pub async fn upsert_pending<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: follow_request::ActiveModel,
    ) -> AppResult<u64> {
        FollowRequest::insert(model)
            .on_conflict(
                OnConflict::columns([
                    follow_request::Column::FollowerId,
                    follow_request::Column::FolloweeId,
                ])
                .update_columns([
                    follow_request::Column::Status,
                    follow_request::Column::UpdatedAt,
                ])
                .action_and_where(
                    follow_request::Column::Status.eq(FollowRequestStatus::Rejected),
                )
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a pending request to `status`.
    ///
    /// Returns `false` when the pair has no pending request; nothing is written
    /// in that case.
    pub async fn set_status_if_pending<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
        status: FollowRequestStatus,
    ) -> AppResult<bool> {
        let result = FollowRequest::update_many()
            .col_expr(follow_request::Column::Status, Expr::value(status.to_value()))
            .col_expr(
                follow_request::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(follow_request::Column::FollowerId.eq(follower_id))
            .filter(follow_request::Column::FolloweeId.eq(followee_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete the pair's request row whatever its status. Returns whether a row was removed.
    pub async fn delete_by_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<bool> {
        let result = FollowRequest::delete_many()
            .filter(follow_request::Column::FollowerId.eq(follower_id))
            .filter(follow_request::Column::FolloweeId.eq(followee_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Pending requests received by a user, newest first.
    pub async fn find_pending_received<C: ConnectionTrait>(
        &self,
        conn: &C,
        followee_id: &str,
    ) -> AppResult<Vec<follow_request::Model>> {
        FollowRequest::find()
            .filter(follow_request::Column::FolloweeId.eq(followee_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .order_by_desc(follow_request::Column::CreatedAt)
            .order_by_desc(follow_request::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
