//! Following service.
//!
//! Owns the relationship between an ordered pair of accounts. A pair is in
//! exactly one of these states, reconstructed from storage on every call:
//!
//! | state          | `following` row | `follow_request` row |
//! |----------------|-----------------|----------------------|
//! | unrelated      | no              | no                   |
//! | pending        | no              | `pending`            |
//! | following      | yes             | none or `accepted`   |
//! | rejected       | no              | `rejected`           |
//!
//! Accepting a request writes the edge in the same transaction, so edge
//! existence alone decides `following` and the follower count.

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::Utc;
use gamerlink_common::{AppError, AppResult, IdGenerator};
use gamerlink_db::{
    entities::{
        follow_request::{self, FollowRequestStatus},
        following, user,
    },
    repositories::{FollowRequestRepository, FollowingRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set, prelude::DateTimeWithTimeZone};
use serde::Serialize;

use crate::services::user::SessionUser;

/// Relationship of a viewer toward a target account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    /// An edge exists.
    Following,
    /// A request is waiting for the target's decision.
    Requested,
    NotFollowing,
    /// The viewer is the target.
    #[serde(rename = "self")]
    Own,
}

impl FollowState {
    /// Wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Following => "following",
            Self::Requested => "requested",
            Self::NotFollowing => "not_following",
            Self::Own => "self",
        }
    }
}

impl fmt::Display for FollowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow state plus the target's follower count, read from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowStatus {
    pub state: FollowState,
    pub followers_count: u64,
}

/// A pending request received by the current user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFollowRequest {
    pub id: String,
    pub follower_id: String,
    pub username: String,
    pub created_at: DateTimeWithTimeZone,
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    db: Arc<DatabaseConnection>,
    following_repo: FollowingRepository,
    follow_request_repo: FollowRequestRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        following_repo: FollowingRepository,
        follow_request_repo: FollowRequestRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            db,
            following_repo,
            follow_request_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a user.
    ///
    /// A public target gets an edge; a private one gets a pending request
    /// (re-opening a rejected one). Repeating the call is harmless.
    pub async fn follow(&self, actor: &SessionUser, username: &str) -> AppResult<FollowState> {
        if actor.username == username {
            return Err(AppError::InvalidOperation("Cannot follow yourself".to_string()));
        }

        let target = self.user_repo.get_by_username(username).await?;
        if target.id == actor.id {
            return Err(AppError::InvalidOperation("Cannot follow yourself".to_string()));
        }

        let txn = gamerlink_db::begin(&self.db).await?;

        if self.following_repo.exists(&txn, &actor.id, &target.id).await? {
            gamerlink_db::commit(txn).await?;
            return Ok(FollowState::Following);
        }

        let state = if target.is_private {
            let now = Utc::now();
            let written = self
                .follow_request_repo
                .upsert_pending(
                    &txn,
                    follow_request::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        follower_id: Set(actor.id.clone()),
                        followee_id: Set(target.id.clone()),
                        status: Set(FollowRequestStatus::Pending),
                        created_at: Set(now.into()),
                        updated_at: Set(Some(now.into())),
                    },
                )
                .await?;

            if written > 0 {
                tracing::info!(
                    follower_id = %actor.id,
                    followee_id = %target.id,
                    "Follow request sent"
                );
            }
            FollowState::Requested
        } else {
            self.insert_edge(&txn, &actor.id, &target.id).await?;
            // A request left over from when the target was private is moot now
            self.follow_request_repo
                .delete_by_pair(&txn, &actor.id, &target.id)
                .await?;

            tracing::info!(
                follower_id = %actor.id,
                followee_id = %target.id,
                "Followed user"
            );
            FollowState::Following
        };

        gamerlink_db::commit(txn).await?;
        Ok(state)
    }

    /// Unfollow a user, withdrawing any request as well.
    ///
    /// Always ends in `not_following`, whatever the pair's previous state.
    pub async fn unfollow(&self, actor: &SessionUser, username: &str) -> AppResult<FollowState> {
        if actor.username == username {
            return Err(AppError::InvalidOperation("Cannot unfollow yourself".to_string()));
        }

        let target = self.user_repo.get_by_username(username).await?;

        let txn = gamerlink_db::begin(&self.db).await?;
        let removed_edge = self
            .following_repo
            .delete_by_pair(&txn, &actor.id, &target.id)
            .await?;
        let removed_request = self
            .follow_request_repo
            .delete_by_pair(&txn, &actor.id, &target.id)
            .await?;
        gamerlink_db::commit(txn).await?;

        tracing::info!(
            follower_id = %actor.id,
            followee_id = %target.id,
            removed_edge,
            removed_request,
            "Unfollowed user"
        );

        Ok(FollowState::NotFollowing)
    }

    /// Accept a pending request sent to `actor` by `username`.
    pub async fn accept_request(
        &self,
        actor: &SessionUser,
        username: &str,
    ) -> AppResult<FollowState> {
        let requester = self.requester(actor, username).await?;

        let txn = gamerlink_db::begin(&self.db).await?;

        if !self
            .follow_request_repo
            .set_status_if_pending(
                &txn,
                &requester.id,
                &actor.id,
                FollowRequestStatus::Accepted,
            )
            .await?
        {
            return Err(AppError::FollowRequestNotFound(username.to_string()));
        }
        self.insert_edge(&txn, &requester.id, &actor.id).await?;

        gamerlink_db::commit(txn).await?;

        tracing::info!(
            follower_id = %requester.id,
            followee_id = %actor.id,
            "Follow request accepted"
        );
        Ok(FollowState::Following)
    }

    /// Reject a pending request sent to `actor` by `username`.
    ///
    /// The requester may ask again later.
    pub async fn reject_request(
        &self,
        actor: &SessionUser,
        username: &str,
    ) -> AppResult<FollowState> {
        let requester = self.requester(actor, username).await?;

        let txn = gamerlink_db::begin(&self.db).await?;

        if !self
            .follow_request_repo
            .set_status_if_pending(
                &txn,
                &requester.id,
                &actor.id,
                FollowRequestStatus::Rejected,
            )
            .await?
        {
            return Err(AppError::FollowRequestNotFound(username.to_string()));
        }

        gamerlink_db::commit(txn).await?;

        tracing::info!(
            follower_id = %requester.id,
            followee_id = %actor.id,
            "Follow request rejected"
        );
        Ok(FollowState::NotFollowing)
    }

    /// The viewer's relationship toward `username`, with that user's follower count.
    pub async fn get_follow_state(
        &self,
        viewer: Option<&SessionUser>,
        username: &str,
    ) -> AppResult<FollowStatus> {
        let target = self.user_repo.get_by_username(username).await?;
        self.follow_status(viewer.map(|v| v.id.as_str()), &target)
            .await
    }

    /// Like [`Self::get_follow_state`] for an already resolved target.
    pub async fn follow_status(
        &self,
        viewer_id: Option<&str>,
        target: &user::Model,
    ) -> AppResult<FollowStatus> {
        let txn = gamerlink_db::begin_snapshot(&self.db).await?;

        let followers_count = self.following_repo.count_followers(&txn, &target.id).await?;

        let state = match viewer_id {
            None => FollowState::NotFollowing,
            Some(id) if id == target.id => FollowState::Own,
            Some(id) => {
                if self.following_repo.exists(&txn, id, &target.id).await? {
                    FollowState::Following
                } else if self
                    .follow_request_repo
                    .exists_pending(&txn, id, &target.id)
                    .await?
                {
                    FollowState::Requested
                } else {
                    FollowState::NotFollowing
                }
            }
        };

        gamerlink_db::commit(txn).await?;

        Ok(FollowStatus {
            state,
            followers_count,
        })
    }

    /// Pending requests received by `actor`, newest first.
    pub async fn list_pending_requests(
        &self,
        actor: &SessionUser,
    ) -> AppResult<Vec<PendingFollowRequest>> {
        let requests = self
            .follow_request_repo
            .find_pending_received(self.db.as_ref(), &actor.id)
            .await?;

        let follower_ids: Vec<String> = requests.iter().map(|r| r.follower_id.clone()).collect();
        let usernames: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&follower_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(requests
            .into_iter()
            .filter_map(|r| {
                let username = usernames.get(&r.follower_id)?.clone();
                Some(PendingFollowRequest {
                    id: r.id,
                    follower_id: r.follower_id,
                    username,
                    created_at: r.created_at,
                })
            })
            .collect())
    }

    async fn requester(&self, actor: &SessionUser, username: &str) -> AppResult<user::Model> {
        if actor.username == username {
            return Err(AppError::InvalidOperation(
                "Cannot answer your own follow request".to_string(),
            ));
        }
        self.user_repo.get_by_username(username).await
    }

    async fn insert_edge(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<()> {
        self.following_repo
            .insert_ignore(
                txn,
                following::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    follower_id: Set(follower_id.to_string()),
                    followee_id: Set(followee_id.to_string()),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_user(id: &str, username: &str, is_private: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            is_private,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_following(follower_id: &str, followee_id: &str) -> following::Model {
        following::Model {
            id: "f1".to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_request(
        follower_id: &str,
        followee_id: &str,
        status: FollowRequestStatus,
    ) -> follow_request::Model {
        follow_request::Model {
            id: "r1".to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            status,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn session(id: &str, username: &str) -> SessionUser {
        SessionUser {
            id: id.to_string(),
            username: username.to_string(),
        }
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n)),
        }]
    }

    fn service(db: MockDatabase) -> FollowingService {
        let db = Arc::new(db.into_connection());
        FollowingService::new(
            Arc::clone(&db),
            FollowingRepository::new(),
            FollowRequestRepository::new(),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_follow_yourself_is_invalid() {
        // Rejected before any storage call
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.follow(&session("alice", "alice"), "alice").await;

        assert!(matches!(result, Err(AppError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.follow(&session("alice", "alice"), "ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_follow_public_user_creates_edge() {
        let bob = create_test_user("bob", "bob", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([Vec::<following::Model>::new()])
                .append_exec_results([exec_result(1), exec_result(0)]),
        );

        let state = service.follow(&session("alice", "alice"), "bob").await.unwrap();

        assert_eq!(state, FollowState::Following);
    }

    #[tokio::test]
    async fn test_follow_private_user_sends_request() {
        let bob = create_test_user("bob", "bob", true);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([Vec::<following::Model>::new()])
                .append_exec_results([exec_result(1)]),
        );

        let state = service.follow(&session("alice", "alice"), "bob").await.unwrap();

        assert_eq!(state, FollowState::Requested);
    }

    #[tokio::test]
    async fn test_follow_private_user_twice_is_idempotent() {
        let bob = create_test_user("bob", "bob", true);

        // Second upsert touches nothing: the row is already pending
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([Vec::<following::Model>::new()])
                .append_exec_results([exec_result(0)]),
        );

        let state = service.follow(&session("alice", "alice"), "bob").await.unwrap();

        assert_eq!(state, FollowState::Requested);
    }

    #[tokio::test]
    async fn test_follow_when_already_following_is_noop() {
        let bob = create_test_user("bob", "bob", true);

        // No exec results: any write would fail
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([[create_test_following("alice", "bob")]]),
        );

        let state = service.follow(&session("alice", "alice"), "bob").await.unwrap();

        assert_eq!(state, FollowState::Following);
    }

    #[tokio::test]
    async fn test_follow_storage_failure_is_internal() {
        let bob = create_test_user("bob", "bob", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([Vec::<following::Model>::new()])
                .append_exec_errors([sea_orm::DbErr::Custom("disk full".to_string())]),
        );

        let result = service.follow(&session("alice", "alice"), "bob").await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn test_unfollow_from_any_state_is_not_following() {
        let bob = create_test_user("bob", "bob", true);

        for (edge, request) in [(1, 0), (0, 1), (0, 0)] {
            let service = service(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[bob.clone()]])
                    .append_exec_results([exec_result(edge), exec_result(request)]),
            );

            let state = service
                .unfollow(&session("alice", "alice"), "bob")
                .await
                .unwrap();

            assert_eq!(state, FollowState::NotFollowing);
        }
    }

    #[tokio::test]
    async fn test_unfollow_unknown_user() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.unfollow(&session("alice", "alice"), "ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_accept_request_creates_edge() {
        let alice = create_test_user("alice", "alice", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .append_exec_results([exec_result(1), exec_result(1)]),
        );

        let state = service
            .accept_request(&session("bob", "bob"), "alice")
            .await
            .unwrap();

        assert_eq!(state, FollowState::Following);
    }

    #[tokio::test]
    async fn test_accept_without_pending_request_not_found() {
        let alice = create_test_user("alice", "alice", false);

        // Only the status update is available; an edge insert would fail
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .append_exec_results([exec_result(0)]),
        );

        let result = service.accept_request(&session("bob", "bob"), "alice").await;

        assert!(matches!(result, Err(AppError::FollowRequestNotFound(_))));
    }

    #[tokio::test]
    async fn test_reject_request() {
        let alice = create_test_user("alice", "alice", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .append_exec_results([exec_result(1)]),
        );

        let state = service
            .reject_request(&session("bob", "bob"), "alice")
            .await
            .unwrap();

        assert_eq!(state, FollowState::NotFollowing);
    }

    #[tokio::test]
    async fn test_reject_without_pending_request_not_found() {
        let alice = create_test_user("alice", "alice", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .append_exec_results([exec_result(0)]),
        );

        let result = service.reject_request(&session("bob", "bob"), "alice").await;

        assert!(matches!(result, Err(AppError::FollowRequestNotFound(_))));
    }

    #[tokio::test]
    async fn test_follow_after_rejection_requests_again() {
        let bob = create_test_user("bob", "bob", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([Vec::<following::Model>::new()])
                .append_exec_results([exec_result(1)])
                .into_connection(),
        );
        let service = FollowingService::new(
            Arc::clone(&db),
            FollowingRepository::new(),
            FollowRequestRepository::new(),
            UserRepository::new(Arc::clone(&db)),
        );

        let state = service.follow(&session("alice", "alice"), "bob").await.unwrap();
        assert_eq!(state, FollowState::Requested);

        drop(service);
        let log = format!(
            "{:?}",
            Arc::try_unwrap(db).unwrap().into_transaction_log()
        );
        // The upsert re-opens the pair's rejected row in place
        assert!(log.contains("ON CONFLICT"));
        assert!(log.contains("rejected"));
    }

    #[tokio::test]
    async fn test_get_follow_state_following() {
        let bob = create_test_user("bob", "bob", true);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([count_row(1)])
                .append_query_results([[create_test_following("alice", "bob")]]),
        );

        let status = service
            .get_follow_state(Some(&session("alice", "alice")), "bob")
            .await
            .unwrap();

        assert_eq!(status.state, FollowState::Following);
        assert_eq!(status.followers_count, 1);
    }

    #[tokio::test]
    async fn test_get_follow_state_requested() {
        let bob = create_test_user("bob", "bob", true);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([count_row(0)])
                .append_query_results([Vec::<following::Model>::new()])
                .append_query_results([[create_test_request(
                    "alice",
                    "bob",
                    FollowRequestStatus::Pending,
                )]]),
        );

        let status = service
            .get_follow_state(Some(&session("alice", "alice")), "bob")
            .await
            .unwrap();

        assert_eq!(status.state, FollowState::Requested);
        assert_eq!(status.followers_count, 0);
    }

    #[tokio::test]
    async fn test_get_follow_state_rejected_reads_not_following() {
        let bob = create_test_user("bob", "bob", true);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([count_row(0)])
                .append_query_results([Vec::<following::Model>::new()])
                .append_query_results([[create_test_request(
                    "alice",
                    "bob",
                    FollowRequestStatus::Rejected,
                )]]),
        );

        let status = service
            .get_follow_state(Some(&session("alice", "alice")), "bob")
            .await
            .unwrap();

        assert_eq!(status.state, FollowState::NotFollowing);
    }

    #[tokio::test]
    async fn test_get_follow_state_self() {
        let alice = create_test_user("alice", "alice", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .append_query_results([count_row(4)]),
        );

        let status = service
            .get_follow_state(Some(&session("alice", "alice")), "alice")
            .await
            .unwrap();

        assert_eq!(status.state, FollowState::Own);
        assert_eq!(status.followers_count, 4);
    }

    #[tokio::test]
    async fn test_get_follow_state_anonymous() {
        let bob = create_test_user("bob", "bob", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([count_row(2)]),
        );

        let status = service.get_follow_state(None, "bob").await.unwrap();

        assert_eq!(status.state, FollowState::NotFollowing);
        assert_eq!(status.followers_count, 2);
    }

    #[tokio::test]
    async fn test_list_pending_requests_includes_usernames() {
        let alice = create_test_user("alice", "alice", false);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request(
                    "alice",
                    "bob",
                    FollowRequestStatus::Pending,
                )]])
                .append_query_results([[alice]]),
        );

        let requests = service
            .list_pending_requests(&session("bob", "bob"))
            .await
            .unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].username, "alice");
    }

    #[test]
    fn test_follow_state_wire_names() {
        assert_eq!(
            serde_json::to_value(FollowState::NotFollowing).unwrap(),
            serde_json::json!("not_following")
        );
        assert_eq!(
            serde_json::to_value(FollowState::Own).unwrap(),
            serde_json::json!("self")
        );
        assert_eq!(FollowState::Requested.to_string(), "requested");
    }
}
