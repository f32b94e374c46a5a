use super::AppState;
use crate::api::extract::{ImageUpload, JsonBody, QueryParams, RecordId};
use crate::api::models::{
    RecipeDetailResponse, RecipeImageResponse, RecipeListQuery, RecipeRequest, RecipeResponse,
};
use crate::auth::middleware::AuthUser;
use crate::core::error::{ApiError, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Handler for GET /recipe/recipes - List the caller's recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(query): QueryParams<RecipeListQuery>,
) -> Result<Json<Vec<RecipeResponse>>> {
    let filter = query.filter()?;
    let recipes = state.recipe_service.list(user.id, filter).await?;

    Ok(Json(
        recipes
            .into_iter()
            .map(|summary| RecipeResponse::new(summary, &state.media))
            .collect(),
    ))
}

/// Handler for POST /recipe/recipes
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<RecipeRequest>,
) -> Result<impl IntoResponse> {
    let input = req.into_input()?;
    let created = state.recipe_service.create(user.id, input).await?;

    Ok((StatusCode::CREATED, Json(RecipeResponse::new(created, &state.media))))
}

/// Handler for GET /recipe/recipes/:id - Nested detail view
pub async fn get_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    RecordId(id): RecordId,
) -> Result<Json<RecipeDetailResponse>> {
    let detail = state.recipe_service.detail(user.id, id).await?;
    Ok(Json(RecipeDetailResponse::new(detail, &state.media)))
}

/// Handler for PUT /recipe/recipes/:id - Full replace; omitted links are cleared
pub async fn replace_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    RecordId(id): RecordId,
    JsonBody(req): JsonBody<RecipeRequest>,
) -> Result<Json<RecipeResponse>> {
    // Ownership first so a foreign id is 404 even with a bad payload
    state.recipe_service.get(user.id, id).await?;
    let input = req.into_input()?;
    let updated = state.recipe_service.update(user.id, id, input.into()).await?;

    Ok(Json(RecipeResponse::new(updated, &state.media)))
}

/// Handler for PATCH /recipe/recipes/:id
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    RecordId(id): RecordId,
    JsonBody(req): JsonBody<RecipeRequest>,
) -> Result<Json<RecipeResponse>> {
    state.recipe_service.get(user.id, id).await?;
    let changes = req.into_changes()?;
    let updated = state.recipe_service.update(user.id, id, changes).await?;

    Ok(Json(RecipeResponse::new(updated, &state.media)))
}

/// Handler for DELETE /recipe/recipes/:id
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    RecordId(id): RecordId,
) -> Result<StatusCode> {
    state.recipe_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /recipe/recipes/:id/upload-image - multipart field `image`
pub async fn upload_recipe_image(
    State(state): State<AppState>,
    user: AuthUser,
    RecordId(id): RecordId,
    ImageUpload(mut multipart): ImageUpload,
) -> Result<Json<RecipeImageResponse>> {
    state.recipe_service.get(user.id, id).await?;

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::field("image", e.body_text()))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::field("image", e.body_text()))?;
            image = Some(data.to_vec());
            break;
        }
    }

    let bytes = image.ok_or_else(|| ApiError::field("image", "No file was submitted."))?;
    let recipe = state.recipe_service.set_image(user.id, id, bytes).await?;

    Ok(Json(RecipeImageResponse {
        id: recipe.id,
        image: recipe.image.map(|path| state.media.public_url(&path)),
    }))
}
