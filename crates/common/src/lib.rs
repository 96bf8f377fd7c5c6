//! Common utilities and shared types for gamerlink.
//!
//! This crate provides foundational components used across all gamerlink crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Sessions**: Bearer token signing and validation via [`SessionKeys`]
//!
//! # Example
//!
//! ```no_run
//! use gamerlink_common::{AppResult, Config, IdGenerator, SessionKeys};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     let keys = SessionKeys::from_config(&config.auth);
//!     let token = keys.issue("alice")?;
//!     let claims = keys.verify(&token)?;
//!     assert_eq!(claims.username, "alice");
//!     println!("Generated ID: {}", IdGenerator::new().generate());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod session;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use session::{SessionClaims, SessionKeys};
