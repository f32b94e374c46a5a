//! API routes

use crate::api::handlers::{
    create_ingredient, create_recipe, create_tag, delete_recipe, get_recipe, health_check,
    list_ingredients, list_recipes, list_tags, replace_recipe, update_recipe, upload_recipe_image,
    AppState,
};
use crate::auth::handlers::{get_me, obtain_token, register, replace_me, update_me};
use crate::auth::middleware::authenticate;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    let upload_limit = state.media.max_upload_size() + MULTIPART_OVERHEAD;

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/user/create", post(register))
        .route("/user/token", post(obtain_token));

    // Protected routes (authentication required). `route_layer` keeps
    // unmatched paths at 404 instead of 401.
    let protected_routes = Router::new()
        .route("/user/me", get(get_me).patch(update_me).put(replace_me))
        .route("/recipe/tags", get(list_tags).post(create_tag))
        .route("/recipe/ingredients", get(list_ingredients).post(create_ingredient))
        .route("/recipe/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipe/recipes/:id",
            get(get_recipe)
                .put(replace_recipe)
                .patch(update_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/recipe/recipes/:id/upload-image",
            post(upload_recipe_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
