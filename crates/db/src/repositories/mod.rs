//! Database repositories.

mod follow_request;
mod following;
mod user;
mod user_game;
mod user_profile;

pub use follow_request::FollowRequestRepository;
pub use following::FollowingRepository;
pub use user::UserRepository;
pub use user_game::UserGameRepository;
pub use user_profile::UserProfileRepository;
