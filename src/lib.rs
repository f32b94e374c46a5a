//! Recipe API Library
//!
//! Account registration and token authentication, plus per-user tags,
//! ingredients and recipes (with image upload) over a SQLite store.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::Config;
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
