//! Database entities.

#![allow(missing_docs)]

pub mod follow_request;
pub mod following;
pub mod user;
pub mod user_game;
pub mod user_profile;

pub use follow_request::Entity as FollowRequest;
pub use following::Entity as Following;
pub use user::Entity as User;
pub use user_game::Entity as UserGame;
pub use user_profile::Entity as UserProfile;
