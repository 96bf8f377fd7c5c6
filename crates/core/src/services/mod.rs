//! Business logic services.

#![allow(missing_docs)]

pub mod following;
pub mod profile;
pub mod user;

pub use following::{FollowState, FollowStatus, FollowingService, PendingFollowRequest};
pub use profile::{
    ConnectGameInput, GameView, LinkedAccount, LinkedAccounts, ProfileService, ProfileView,
    UserSummary,
};
pub use user::{CredentialsInput, LoginOutput, SessionUser, UserService};
