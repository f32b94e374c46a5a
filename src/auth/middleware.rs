//! Authentication middleware

use crate::api::handlers::AppState;
use crate::auth::token::hash_token;
use crate::core::error::{ApiError, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Extension to store authenticated user info in request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
}

/// Pull the key out of `Authorization: Bearer <key>` or `Authorization: Token <key>`
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;

    let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token");
    let key = key.trim();
    if known && !key.is_empty() {
        Some(key)
    } else {
        None
    }
}

/// Authentication middleware
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match token_from_headers(request.headers()) {
        Some(token) => token.to_string(),
        None => {
            return ApiError::AuthenticationError(
                "Authentication credentials were not provided.".to_string(),
            )
            .into_response()
        }
    };

    let user = match state.token_repo.find_user(&hash_token(&token)).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return ApiError::AuthenticationError("Invalid token.".to_string()).into_response()
        }
        Err(e) => return e.into_response(),
    };

    tracing::debug!(user_id = user.id, "Request authenticated");

    request.extensions_mut().insert(AuthUser { id: user.id });

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::AuthenticationError("User not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_token_schemes() {
        assert_eq!(token_from_headers(&headers("Bearer abc")), Some("abc"));
        assert_eq!(token_from_headers(&headers("Token abc")), Some("abc"));
        assert_eq!(token_from_headers(&headers("token  abc ")), Some("abc"));
        assert_eq!(token_from_headers(&headers("Basic abc")), None);
        assert_eq!(token_from_headers(&headers("Bearer")), None);
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
