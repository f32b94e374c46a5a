//! Business logic services
//!
//! `RecipeService` coordinates the recipe, tag and ingredient repositories with
//! the media store. Every call is scoped to the owner passed in; a recipe that
//! belongs to someone else is reported as not found.

use crate::core::error::{ApiError, Result};
use crate::core::media::MediaStore;
use crate::db::models::{Attribute, NewRecipe, Price, Recipe};
use crate::db::repository::{AttributeRepository, OwnedRepository, RecipeFilter, RecipeRepository};
use std::sync::Arc;

/// A recipe with the ids of its tags and ingredients
#[derive(Debug, Clone)]
pub struct RecipeSummary {
    pub recipe: Recipe,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// A recipe with its tags and ingredients expanded
#[derive(Debug, Clone)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

/// Complete, validated recipe fields for create and full replace
#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// Validated partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

impl From<RecipeInput> for RecipeChanges {
    fn from(input: RecipeInput) -> Self {
        Self {
            title: Some(input.title),
            time_minutes: Some(input.time_minutes),
            price: Some(input.price),
            link: Some(input.link),
            tag_ids: Some(input.tag_ids),
            ingredient_ids: Some(input.ingredient_ids),
        }
    }
}

fn dedup(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Recipe service for managing recipe business logic
pub struct RecipeService {
    recipes: Arc<RecipeRepository>,
    tags: Arc<AttributeRepository>,
    ingredients: Arc<AttributeRepository>,
    media: Arc<MediaStore>,
}

impl RecipeService {
    /// Create a new RecipeService
    pub fn new(
        recipes: Arc<RecipeRepository>,
        tags: Arc<AttributeRepository>,
        ingredients: Arc<AttributeRepository>,
        media: Arc<MediaStore>,
    ) -> Self {
        Self {
            recipes,
            tags,
            ingredients,
            media,
        }
    }

    /// The owner's recipes, newest first, with their link ids
    pub async fn list(&self, owner_id: i64, filter: RecipeFilter) -> Result<Vec<RecipeSummary>> {
        let recipes = self.recipes.list_filtered(owner_id, filter).await?;
        let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();

        let mut tag_links = self.tags.ids_by_recipe(ids.clone()).await?;
        let mut ingredient_links = self.ingredients.ids_by_recipe(ids).await?;

        Ok(recipes
            .into_iter()
            .map(|recipe| RecipeSummary {
                tag_ids: tag_links.remove(&recipe.id).unwrap_or_default(),
                ingredient_ids: ingredient_links.remove(&recipe.id).unwrap_or_default(),
                recipe,
            })
            .collect())
    }

    /// Find an owned recipe or fail with 404
    pub async fn get(&self, owner_id: i64, recipe_id: i64) -> Result<Recipe> {
        self.recipes
            .find_owned(owner_id, recipe_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Recipe {} not found", recipe_id)))
    }

    pub async fn detail(&self, owner_id: i64, recipe_id: i64) -> Result<RecipeDetail> {
        let recipe = self.get(owner_id, recipe_id).await?;
        let tags = self.tags.for_recipe(recipe.id).await?;
        let ingredients = self.ingredients.for_recipe(recipe.id).await?;

        Ok(RecipeDetail {
            recipe,
            tags,
            ingredients,
        })
    }

    async fn summary(&self, recipe: Recipe) -> Result<RecipeSummary> {
        let mut tag_links = self.tags.ids_by_recipe(vec![recipe.id]).await?;
        let mut ingredient_links = self.ingredients.ids_by_recipe(vec![recipe.id]).await?;

        Ok(RecipeSummary {
            tag_ids: tag_links.remove(&recipe.id).unwrap_or_default(),
            ingredient_ids: ingredient_links.remove(&recipe.id).unwrap_or_default(),
            recipe,
        })
    }

    /// Create a recipe owned by `owner_id`
    pub async fn create(&self, owner_id: i64, input: RecipeInput) -> Result<RecipeSummary> {
        let recipe = self
            .recipes
            .create(
                NewRecipe {
                    user_id: owner_id,
                    title: input.title,
                    time_minutes: input.time_minutes,
                    price: input.price,
                    link: input.link,
                },
                dedup(input.tag_ids),
                dedup(input.ingredient_ids),
            )
            .await?;

        tracing::info!(recipe_id = recipe.id, user_id = owner_id, "Recipe created");
        self.summary(recipe).await
    }

    /// Apply `changes` to an owned recipe
    pub async fn update(
        &self,
        owner_id: i64,
        recipe_id: i64,
        changes: RecipeChanges,
    ) -> Result<RecipeSummary> {
        let mut recipe = self.get(owner_id, recipe_id).await?;

        if let Some(title) = changes.title {
            recipe.title = title;
        }
        if let Some(time_minutes) = changes.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = changes.price {
            recipe.price = price;
        }
        if let Some(link) = changes.link {
            recipe.link = link;
        }

        let recipe = self
            .recipes
            .update(
                recipe,
                changes.tag_ids.map(dedup),
                changes.ingredient_ids.map(dedup),
            )
            .await?;

        tracing::info!(recipe_id = recipe.id, user_id = owner_id, "Recipe updated");
        self.summary(recipe).await
    }

    /// Delete an owned recipe and its image file
    pub async fn delete(&self, owner_id: i64, recipe_id: i64) -> Result<()> {
        let recipe = self.get(owner_id, recipe_id).await?;

        if !self.recipes.delete(owner_id, recipe_id).await? {
            return Err(ApiError::NotFound(format!("Recipe {} not found", recipe_id)));
        }

        if let Some(image) = &recipe.image {
            if let Err(e) = self.media.delete(image).await {
                tracing::warn!(recipe_id, error = %e, "Failed to remove recipe image");
            }
        }

        tracing::info!(recipe_id, user_id = owner_id, "Recipe deleted");
        Ok(())
    }

    /// Store a new image for an owned recipe, replacing any previous one
    pub async fn set_image(&self, owner_id: i64, recipe_id: i64, bytes: Vec<u8>) -> Result<Recipe> {
        let mut recipe = self.get(owner_id, recipe_id).await?;
        let stored = self.media.save_recipe_image(bytes).await?;

        if let Err(e) = self.recipes.set_image(owner_id, recipe.id, Some(stored.clone())).await {
            // Don't leave an orphaned file behind
            let _ = self.media.delete(&stored).await;
            return Err(e);
        }

        if let Some(previous) = recipe.image.replace(stored) {
            if let Err(e) = self.media.delete(&previous).await {
                tracing::warn!(recipe_id, error = %e, "Failed to remove previous recipe image");
            }
        }

        tracing::info!(recipe_id, user_id = owner_id, "Recipe image uploaded");
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use crate::core::media::sample_png;
    use crate::db::manager::DatabaseManager;
    use crate::db::models::{AttributeKind, NewUser};
    use crate::db::repository::UserRepository;
    use tempfile::TempDir;

    struct Fixture {
        service: RecipeService,
        tags: Arc<AttributeRepository>,
        owner: i64,
        stranger: i64,
        media_dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let users = UserRepository::new(db.clone());
        let mut ids = Vec::new();
        for email in ["owner@example.com", "stranger@example.com"] {
            let user = users
                .create(&NewUser {
                    email: email.to_string(),
                    name: String::new(),
                    password_hash: "hash".to_string(),
                    is_staff: false,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }

        let media_dir = TempDir::new().unwrap();
        let media = MediaStore::new(&StorageConfig {
            media_root: media_dir.path().to_path_buf(),
            media_url: "/media".to_string(),
            max_upload_size: 1024 * 1024,
        })
        .unwrap();

        let tags = Arc::new(AttributeRepository::new(db.clone(), AttributeKind::Tag));
        let service = RecipeService::new(
            Arc::new(RecipeRepository::new(db.clone())),
            tags.clone(),
            Arc::new(AttributeRepository::new(db, AttributeKind::Ingredient)),
            Arc::new(media),
        );

        Fixture {
            service,
            tags,
            owner: ids[0],
            stranger: ids[1],
            media_dir,
        }
    }

    fn input(title: &str, tag_ids: Vec<i64>) -> RecipeInput {
        RecipeInput {
            title: title.to_string(),
            time_minutes: 5,
            price: Price::from_cents(500).unwrap(),
            link: String::new(),
            tag_ids,
            ingredient_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_collapse() {
        let f = fixture().await;
        let tag = f.tags.create(f.owner, "Dinner").await.unwrap();

        let created = f
            .service
            .create(f.owner, input("Stew", vec![tag.id, tag.id]))
            .await
            .unwrap();
        assert_eq!(created.tag_ids, vec![tag.id]);
    }

    #[tokio::test]
    async fn test_full_replace_clears_tags() {
        let f = fixture().await;
        let tag = f.tags.create(f.owner, "Dinner").await.unwrap();
        let created = f
            .service
            .create(f.owner, input("Stew", vec![tag.id]))
            .await
            .unwrap();

        let replaced = f
            .service
            .update(f.owner, created.recipe.id, input("Soup", vec![]).into())
            .await
            .unwrap();
        assert_eq!(replaced.recipe.title, "Soup");
        assert!(replaced.tag_ids.is_empty());
    }

    #[tokio::test]
    async fn test_stranger_gets_not_found() {
        let f = fixture().await;
        let created = f.service.create(f.owner, input("Stew", vec![])).await.unwrap();

        let err = f.service.detail(f.stranger, created.recipe.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = f
            .service
            .update(f.stranger, created.recipe.id, RecipeChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_image_replacement_and_delete_clean_up_files() {
        let f = fixture().await;
        let created = f.service.create(f.owner, input("Stew", vec![])).await.unwrap();
        let id = created.recipe.id;

        let first = f.service.set_image(f.owner, id, sample_png()).await.unwrap();
        let first_path = f.media_dir.path().join(first.image.clone().unwrap());
        assert!(first_path.exists());

        let second = f.service.set_image(f.owner, id, sample_png()).await.unwrap();
        let second_path = f.media_dir.path().join(second.image.clone().unwrap());
        assert!(!first_path.exists());
        assert!(second_path.exists());

        f.service.delete(f.owner, id).await.unwrap();
        assert!(!second_path.exists());
    }

    #[tokio::test]
    async fn test_invalid_image_leaves_recipe_unchanged() {
        let f = fixture().await;
        let created = f.service.create(f.owner, input("Stew", vec![])).await.unwrap();

        assert!(f
            .service
            .set_image(f.owner, created.recipe.id, b"notimage".to_vec())
            .await
            .is_err());
        let recipe = f.service.get(f.owner, created.recipe.id).await.unwrap();
        assert!(recipe.image.is_none());
    }
}
