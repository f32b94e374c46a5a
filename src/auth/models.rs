//! Authentication request/response models
//!
//! Request fields are optional at the serde level; handlers report missing
//! ones as field errors.

use crate::db::models::User;
use serde::{Deserialize, Serialize};

/// Register request
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Token request
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public account fields; the password never leaves the server
#[derive(Debug, Serialize, PartialEq)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

/// Update user request, shared by PATCH and PUT
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}
