//! Authentication API handlers

use crate::api::extract::JsonBody;
use crate::api::handlers::AppState;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{RegisterRequest, TokenRequest, TokenResponse, UpdateUserRequest, UserInfo};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{generate_token, hash_token};
use crate::core::error::{ApiError, Result};
use crate::core::validation;
use crate::db::models::{NewUser, User};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

fn bad_credentials() -> ApiError {
    ApiError::field(
        "non_field_errors",
        "Unable to authenticate with provided credentials.",
    )
}

/// Handler for POST /user/create - User registration
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let security = &state.config.security;

    let email = validation::email(req.email.as_deref())?;
    let password = validation::password(req.password.as_deref(), security.min_password_length)?;
    let name = validation::optional_text("name", req.name.as_deref())?.unwrap_or_default();

    tracing::info!(email = %email, "User registration attempt");

    if state.user_repo.find_by_email(&email).await?.is_some() {
        tracing::warn!(email = %email, "Registration rejected: email in use");
        return Err(ApiError::field("email", "user with this email already exists."));
    }

    let user = state
        .user_repo
        .create(&NewUser {
            email,
            name,
            password_hash: hash_password(&password, security.bcrypt_cost).await?,
            is_staff: false,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered successfully");

    Ok((StatusCode::CREATED, Json(UserInfo::from(user))))
}

/// Handler for POST /user/token - Exchange credentials for an API token
pub async fn obtain_token(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let email = validation::required_text("email", req.email.as_deref())?;
    let password = match req.password.as_deref() {
        None => return Err(validation::required("password")),
        Some("") => return Err(ApiError::field("password", "This field may not be blank.")),
        Some(password) => password.to_string(),
    };

    let email = validation::normalize_email(&email);
    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or_else(bad_credentials)?;

    if !user.is_active || !verify_password(&password, &user.password_hash).await? {
        tracing::warn!(user_id = user.id, "Token request with invalid credentials");
        return Err(bad_credentials());
    }

    let token = generate_token();
    state.token_repo.rotate(user.id, &hash_token(&token)).await?;

    tracing::info!(user_id = user.id, "Token issued");

    Ok(Json(TokenResponse { token }))
}

async fn current_user(state: &AppState, auth: &AuthUser) -> Result<User> {
    state
        .user_repo
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::AuthenticationError("User not found".to_string()))
}

/// Handler for GET /user/me - Get current user info
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> Result<Json<UserInfo>> {
    Ok(Json(current_user(&state, &user).await?.into()))
}

/// Handler for PATCH /user/me - Update the supplied fields only
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserInfo>> {
    apply_profile_update(&state, &user, req, true).await
}

/// Handler for PUT /user/me - Replace email, password and name
pub async fn replace_me(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserInfo>> {
    apply_profile_update(&state, &user, req, false).await
}

async fn apply_profile_update(
    state: &AppState,
    auth: &AuthUser,
    req: UpdateUserRequest,
    partial: bool,
) -> Result<Json<UserInfo>> {
    let security = &state.config.security;

    // Validate everything before touching the record
    let email = match (&req.email, partial) {
        (None, true) => None,
        (email, _) => Some(validation::email(email.as_deref())?),
    };
    let password = match (&req.password, partial) {
        (None, true) => None,
        (password, _) => Some(validation::password(
            password.as_deref(),
            security.min_password_length,
        )?),
    };
    let name = validation::optional_text("name", req.name.as_deref())?;

    let mut db_user = current_user(state, auth).await?;

    if let Some(email) = email {
        if email != db_user.email && state.user_repo.find_by_email(&email).await?.is_some() {
            return Err(ApiError::field("email", "user with this email already exists."));
        }
        db_user.email = email;
    }
    if let Some(password) = password {
        db_user.password_hash = hash_password(&password, security.bcrypt_cost).await?;
    }
    match name {
        Some(name) => db_user.name = name,
        None if !partial => db_user.name = String::new(),
        None => {}
    }

    state.user_repo.update(&db_user).await?;

    tracing::info!(user_id = db_user.id, "User info updated successfully");

    Ok(Json(db_user.into()))
}
