//! Startup creation of the configured staff account

use crate::auth::password::hash_password;
use crate::core::config::{AdminConfig, SecurityConfig};
use crate::core::error::{ApiError, Result};
use crate::core::validation;
use crate::db::models::NewUser;
use crate::db::repository::UserRepository;

/// Create the `[admin]` account if it is configured and missing.
/// Returns true when an account was created.
pub async fn ensure_admin(
    users: &UserRepository,
    admin: &AdminConfig,
    security: &SecurityConfig,
) -> Result<bool> {
    let Some((email, password)) = admin.credentials() else {
        return Ok(false);
    };

    let email = validation::email(Some(email))
        .map_err(|e| ApiError::ConfigError(format!("admin.email: {}", e)))?;

    if users.find_by_email(&email).await?.is_some() {
        tracing::debug!(email = %email, "Admin account already present");
        return Ok(false);
    }

    let user = users
        .create(&NewUser {
            email,
            name: admin.name.clone().unwrap_or_default(),
            password_hash: hash_password(password, security.bcrypt_cost).await?,
            is_staff: true,
        })
        .await?;

    tracing::info!(user_id = user.id, email = %user.email, "Created admin account");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::db::manager::DatabaseManager;
    use std::sync::Arc;

    fn security() -> SecurityConfig {
        let mut security = Config::defaults().unwrap().security;
        security.bcrypt_cost = 4;
        security
    }

    #[tokio::test]
    async fn test_creates_staff_account_once() {
        let users = UserRepository::new(Arc::new(DatabaseManager::new_in_memory().unwrap()));
        let admin = AdminConfig {
            email: Some("chef@EXAMPLE.com".to_string()),
            password: Some("secret123".to_string()),
            name: Some("Head Chef".to_string()),
        };

        assert!(ensure_admin(&users, &admin, &security()).await.unwrap());
        assert!(!ensure_admin(&users, &admin, &security()).await.unwrap());

        let user = users.find_by_email("chef@example.com").await.unwrap().unwrap();
        assert!(user.is_staff);
        assert_eq!(user.name, "Head Chef");
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_admin_is_skipped() {
        let users = UserRepository::new(Arc::new(DatabaseManager::new_in_memory().unwrap()));
        assert!(!ensure_admin(&users, &AdminConfig::default(), &security()).await.unwrap());
        assert_eq!(users.count().await.unwrap(), 0);
    }
}
