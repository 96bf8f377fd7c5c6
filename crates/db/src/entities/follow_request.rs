//! Follow request entity (requests to follow private accounts).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a follow request.
///
/// A pair has at most one request row; transitions overwrite the status in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum FollowRequestStatus {
    /// Waiting for the followee to decide.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted; a following row exists for the pair.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Rejected; the follower may ask again.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who sent the follow request
    pub follower_id: String,

    /// The user who received the follow request
    pub followee_id: String,

    pub status: FollowRequestStatus,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FollowerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Follower,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FolloweeId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Followee,
}

impl ActiveModelBehavior for ActiveModel {}
