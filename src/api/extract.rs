//! Request extractors

use crate::core::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

/// `Json<T>` whose rejections (bad syntax, wrong types, missing content type)
/// become a 400 `ApiError` instead of axum's plain-text 400/415/422
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::InvalidRequest(rejection.body_text())),
        }
    }
}

/// Numeric `:id` path segment; anything unparsable is a missing record
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(RecordId(id)),
            Err(rejection) => Err(ApiError::NotFound(rejection.body_text())),
        }
    }
}

/// `Query<T>` with rejections reported as a JSON 400
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(ApiError::InvalidRequest(rejection.body_text())),
        }
    }
}

/// Multipart body of an image upload; a missing or malformed form is an `image` field error
pub struct ImageUpload(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Multipart::from_request(request, state).await {
            Ok(multipart) => Ok(ImageUpload(multipart)),
            Err(rejection) => Err(ApiError::field("image", rejection.body_text())),
        }
    }
}
