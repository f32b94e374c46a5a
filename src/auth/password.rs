//! Password hashing and verification using bcrypt
//!
//! Both operations are CPU-bound and run on the blocking thread pool.

use crate::core::error::{ApiError, Result};

/// Hash a password using bcrypt at the given cost
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::TaskError(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::TaskError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash; a malformed hash never matches
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::TaskError(format!("Password verification task failed: {}", e)))?;

    Ok(verified.unwrap_or(false))
}
