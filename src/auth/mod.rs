//! Authentication module
//!
//! This module provides authentication functionality including:
//! - User registration and token issuance
//! - Opaque token generation and hashing
//! - Password hashing and verification
//! - Authentication middleware
//! - Staff account bootstrap

pub mod token;
pub mod password;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod bootstrap;

pub use token::{generate_token, hash_token};
pub use password::{hash_password, verify_password};
pub use middleware::{authenticate, AuthUser};
pub use handlers::{get_me, obtain_token, register, replace_me, update_me};
pub use bootstrap::ensure_admin;
