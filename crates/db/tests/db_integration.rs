//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `gamerlink_test`)
//!   `TEST_DB_PASSWORD` (default: `gamerlink_test`)
//!   `TEST_DB_NAME` (default: `gamerlink_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use gamerlink_db::{
    entities::{
        FollowRequest, Following, follow_request, follow_request::FollowRequestStatus, following,
        user,
    },
    repositories::{FollowRequestRepository, FollowingRepository},
    test_utils::{TestDatabase, TestDbConfig},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

async fn migrated_db() -> TestDatabase {
    TestDatabase::migrated().await.expect("Failed to prepare test database")
}

async fn insert_user(db: &TestDatabase, id: &str, username: &str, is_private: bool) {
    user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(username.to_string()),
        password_hash: Set("x".to_string()),
        is_private: Set(is_private),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(db.connection())
    .await
    .unwrap();
}

fn edge(id: &str, follower_id: &str, followee_id: &str) -> following::ActiveModel {
    following::ActiveModel {
        id: Set(id.to_string()),
        follower_id: Set(follower_id.to_string()),
        followee_id: Set(followee_id.to_string()),
        created_at: Set(Utc::now().into()),
    }
}

fn pending(id: &str, follower_id: &str, followee_id: &str) -> follow_request::ActiveModel {
    follow_request::ActiveModel {
        id: Set(id.to_string()),
        follower_id: Set(follower_id.to_string()),
        followee_id: Set(followee_id.to_string()),
        status: Set(FollowRequestStatus::Pending),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Some(Utc::now().into())),
    }
}

async fn request_rows(db: &TestDatabase, follower_id: &str, followee_id: &str) -> u64 {
    FollowRequest::find()
        .filter(follow_request::Column::FollowerId.eq(follower_id))
        .filter(follow_request::Column::FolloweeId.eq(followee_id))
        .count(db.connection())
        .await
        .unwrap()
}

async fn edge_rows(db: &TestDatabase, follower_id: &str, followee_id: &str) -> u64 {
    Following::find()
        .filter(following::Column::FollowerId.eq(follower_id))
        .filter(following::Column::FolloweeId.eq(followee_id))
        .count(db.connection())
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_insert_ignore_keeps_one_edge() {
    let db = migrated_db().await;
    insert_user(&db, "alice", "alice", false).await;
    insert_user(&db, "bob", "bob", false).await;

    let repo = FollowingRepository::new();
    assert!(repo.insert_ignore(db.connection(), edge("e1", "alice", "bob")).await.unwrap());
    assert!(!repo.insert_ignore(db.connection(), edge("e2", "alice", "bob")).await.unwrap());

    assert_eq!(edge_rows(&db, "alice", "bob").await, 1);
    assert_eq!(repo.count_followers(db.connection(), "bob").await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_self_edge_rejected_by_schema() {
    let db = migrated_db().await;
    insert_user(&db, "alice", "alice", false).await;

    let repo = FollowingRepository::new();
    let result = repo
        .insert_ignore(db.connection(), edge("e1", "alice", "alice"))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_upsert_pending_resets_rejected_but_keeps_pending() {
    let db = migrated_db().await;
    insert_user(&db, "alice", "alice", false).await;
    insert_user(&db, "bob", "bob", true).await;

    let repo = FollowRequestRepository::new();
    assert_eq!(
        repo.upsert_pending(db.connection(), pending("r1", "alice", "bob"))
            .await
            .unwrap(),
        1
    );
    // Already pending: untouched
    assert_eq!(
        repo.upsert_pending(db.connection(), pending("r2", "alice", "bob"))
            .await
            .unwrap(),
        0
    );

    assert!(
        repo.set_status_if_pending(db.connection(), "alice", "bob", FollowRequestStatus::Rejected)
            .await
            .unwrap()
    );
    assert!(!repo.exists_pending(db.connection(), "alice", "bob").await.unwrap());

    // Rejected: reset to pending in place
    assert_eq!(
        repo.upsert_pending(db.connection(), pending("r3", "alice", "bob"))
            .await
            .unwrap(),
        1
    );
    assert!(repo.exists_pending(db.connection(), "alice", "bob").await.unwrap());
    assert_eq!(request_rows(&db, "alice", "bob").await, 1);

    let row = repo
        .find_by_pair(db.connection(), "alice", "bob")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.id, "r1");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_set_status_ignores_decided_requests() {
    let db = migrated_db().await;
    insert_user(&db, "alice", "alice", false).await;
    insert_user(&db, "bob", "bob", true).await;

    let repo = FollowRequestRepository::new();
    repo.upsert_pending(db.connection(), pending("r1", "alice", "bob"))
        .await
        .unwrap();

    assert!(
        repo.set_status_if_pending(db.connection(), "alice", "bob", FollowRequestStatus::Accepted)
            .await
            .unwrap()
    );
    assert!(
        !repo
            .set_status_if_pending(db.connection(), "alice", "bob", FollowRequestStatus::Rejected)
            .await
            .unwrap()
    );

    let row = repo
        .find_by_pair(db.connection(), "alice", "bob")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, FollowRequestStatus::Accepted);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_upsert_pending_never_downgrades_accepted() {
    let db = migrated_db().await;
    insert_user(&db, "alice", "alice", false).await;
    insert_user(&db, "bob", "bob", true).await;

    let repo = FollowRequestRepository::new();
    repo.upsert_pending(db.connection(), pending("r1", "alice", "bob"))
        .await
        .unwrap();
    assert!(
        repo.set_status_if_pending(db.connection(), "alice", "bob", FollowRequestStatus::Accepted)
            .await
            .unwrap()
    );

    assert_eq!(
        repo.upsert_pending(db.connection(), pending("r2", "alice", "bob"))
            .await
            .unwrap(),
        0
    );

    let row = repo
        .find_by_pair(db.connection(), "alice", "bob")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.id, "r1");
    assert_eq!(row.status, FollowRequestStatus::Accepted);
    assert_eq!(request_rows(&db, "alice", "bob").await, 1);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_rolled_back_transaction_leaves_no_rows() {
    let db = migrated_db().await;
    insert_user(&db, "alice", "alice", false).await;
    insert_user(&db, "bob", "bob", false).await;

    let repo = FollowingRepository::new();
    {
        let txn = gamerlink_db::begin(db.connection()).await.unwrap();
        repo.insert_ignore(&txn, edge("e1", "alice", "bob"))
            .await
            .unwrap();
        // Dropped without commit
    }

    assert_eq!(edge_rows(&db, "alice", "bob").await, 0);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_snapshot_transaction_is_read_only() {
    let db = migrated_db().await;
    insert_user(&db, "alice", "alice", false).await;
    insert_user(&db, "bob", "bob", false).await;

    let txn = gamerlink_db::begin_snapshot(db.connection()).await.unwrap();
    let result = FollowingRepository::new()
        .insert_ignore(&txn, edge("e1", "alice", "bob"))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_deleting_user_cascades_to_follow_graph() {
    let db = TestDatabase::create_unique().await.unwrap();
    insert_user(&db, "alice", "alice", false).await;
    insert_user(&db, "bob", "bob", true).await;

    FollowingRepository::new()
        .insert_ignore(db.connection(), edge("e1", "alice", "bob"))
        .await
        .unwrap();
    FollowRequestRepository::new()
        .upsert_pending(db.connection(), pending("r1", "bob", "alice"))
        .await
        .unwrap();

    user::Entity::delete_by_id("bob".to_string())
        .exec(db.connection())
        .await
        .unwrap();

    assert_eq!(edge_rows(&db, "alice", "bob").await, 0);
    assert_eq!(request_rows(&db, "bob", "alice").await, 0);

    db.drop_database().await.unwrap();
}

#[test]
fn test_default_config_targets_postgres() {
    let config = TestDbConfig::default();
    assert!(config.database_url().starts_with("postgres://"));
    assert!(config.postgres_url().ends_with("/postgres"));
}
