//! Tag and ingredient handlers
//!
//! Both resources behave identically; the public handlers only pick the kind.

use super::AppState;
use crate::api::extract::{JsonBody, QueryParams};
use crate::api::models::{AttributeListQuery, AttributeResponse, CreateAttributeRequest};
use crate::auth::middleware::AuthUser;
use crate::core::error::Result;
use crate::core::validation;
use crate::db::models::AttributeKind;
use crate::db::repository::OwnedRepository;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

async fn list(
    state: &AppState,
    user: &AuthUser,
    kind: AttributeKind,
    query: &AttributeListQuery,
) -> Result<Json<Vec<AttributeResponse>>> {
    let repo = state.attributes(kind);
    let records = if query.assigned_only()? {
        repo.list_assigned_to_recipes(user.id).await?
    } else {
        repo.list_by_owner(user.id).await?
    };

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

async fn create(
    state: &AppState,
    user: &AuthUser,
    kind: AttributeKind,
    req: CreateAttributeRequest,
) -> Result<impl IntoResponse> {
    let name = validation::required_text("name", req.name.as_deref())?;
    let record = state.attributes(kind).create(user.id, &name).await?;

    tracing::info!(id = record.id, user_id = user.id, "{} created", kind.label());

    Ok((StatusCode::CREATED, Json(AttributeResponse::from(record))))
}

/// Handler for GET /recipe/tags
pub async fn list_tags(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(query): QueryParams<AttributeListQuery>,
) -> Result<Json<Vec<AttributeResponse>>> {
    list(&state, &user, AttributeKind::Tag, &query).await
}

/// Handler for POST /recipe/tags
pub async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateAttributeRequest>,
) -> Result<impl IntoResponse> {
    create(&state, &user, AttributeKind::Tag, req).await
}

/// Handler for GET /recipe/ingredients
pub async fn list_ingredients(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(query): QueryParams<AttributeListQuery>,
) -> Result<Json<Vec<AttributeResponse>>> {
    list(&state, &user, AttributeKind::Ingredient, &query).await
}

/// Handler for POST /recipe/ingredients
pub async fn create_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateAttributeRequest>,
) -> Result<impl IntoResponse> {
    create(&state, &user, AttributeKind::Ingredient, req).await
}
