pub mod attributes;
pub mod recipes;
pub mod system;

pub use attributes::*;
pub use recipes::*;
pub use system::*;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::media::MediaStore;
use crate::core::services::RecipeService;
use crate::db::manager::DatabaseManager;
use crate::db::models::AttributeKind;
use crate::db::repository::{AttributeRepository, RecipeRepository, TokenRepository, UserRepository};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<UserRepository>,
    pub token_repo: Arc<TokenRepository>,
    pub tag_repo: Arc<AttributeRepository>,
    pub ingredient_repo: Arc<AttributeRepository>,
    pub recipe_service: Arc<RecipeService>,
    pub media: Arc<MediaStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire repositories and services over one database
    pub fn new(config: Config, db: Arc<DatabaseManager>) -> Result<Self> {
        let media = Arc::new(MediaStore::new(&config.storage)?);
        let tag_repo = Arc::new(AttributeRepository::new(db.clone(), AttributeKind::Tag));
        let ingredient_repo = Arc::new(AttributeRepository::new(db.clone(), AttributeKind::Ingredient));
        let recipe_repo = Arc::new(RecipeRepository::new(db.clone()));

        let recipe_service = Arc::new(RecipeService::new(
            recipe_repo,
            tag_repo.clone(),
            ingredient_repo.clone(),
            media.clone(),
        ));

        Ok(Self {
            user_repo: Arc::new(UserRepository::new(db.clone())),
            token_repo: Arc::new(TokenRepository::new(db)),
            tag_repo,
            ingredient_repo,
            recipe_service,
            media,
            config: Arc::new(config),
        })
    }

    pub fn attributes(&self, kind: AttributeKind) -> &AttributeRepository {
        match kind {
            AttributeKind::Tag => &self.tag_repo,
            AttributeKind::Ingredient => &self.ingredient_repo,
        }
    }
}
