//! Core business logic for gamerlink.

pub mod services;

pub use services::*;
