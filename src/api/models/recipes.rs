use crate::api::models::attributes::AttributeResponse;
use crate::api::models::common::{id_list, non_negative_integer, query_id_list};
use crate::core::error::{ApiError, Result};
use crate::core::media::MediaStore;
use crate::core::services::{RecipeChanges, RecipeDetail, RecipeInput, RecipeSummary};
use crate::core::validation;
use crate::db::models::Price;
use crate::db::repository::RecipeFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// List view: tags and ingredients as id lists
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub image: Option<String>,
}

impl RecipeResponse {
    pub fn new(summary: RecipeSummary, media: &MediaStore) -> Self {
        let recipe = summary.recipe;
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: summary.ingredient_ids,
            tags: summary.tag_ids,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image.map(|path| media.public_url(&path)),
        }
    }
}

/// Detail view: tags and ingredients expanded to `{id, name}`
#[derive(Debug, Serialize)]
pub struct RecipeDetailResponse {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<AttributeResponse>,
    pub tags: Vec<AttributeResponse>,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub image: Option<String>,
}

impl RecipeDetailResponse {
    pub fn new(detail: RecipeDetail, media: &MediaStore) -> Self {
        let recipe = detail.recipe;
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: detail.ingredients.into_iter().map(Into::into).collect(),
            tags: detail.tags.into_iter().map(Into::into).collect(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image.map(|path| media.public_url(&path)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

/// Body for create, PUT and PATCH. Values stay loosely typed until validated.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<Value>,
    pub price: Option<Value>,
    pub link: Option<String>,
    pub tags: Option<Value>,
    pub ingredients: Option<Value>,
}

fn price(value: &Value) -> Result<Price> {
    Price::from_json(value).map_err(|message| ApiError::field("price", message))
}

impl RecipeRequest {
    /// Validate a complete payload (create and PUT)
    pub fn into_input(self) -> Result<RecipeInput> {
        let title = validation::required_text("title", self.title.as_deref())?;
        let time_minutes = self
            .time_minutes
            .as_ref()
            .ok_or_else(|| validation::required("time_minutes"))
            .and_then(|v| non_negative_integer("time_minutes", v))?;
        let price = self
            .price
            .as_ref()
            .ok_or_else(|| validation::required("price"))
            .and_then(price)?;
        let link = validation::optional_text("link", self.link.as_deref())?.unwrap_or_default();
        let tag_ids = match &self.tags {
            Some(v) => id_list("tags", v)?,
            None => Vec::new(),
        };
        let ingredient_ids = match &self.ingredients {
            Some(v) => id_list("ingredients", v)?,
            None => Vec::new(),
        };

        Ok(RecipeInput {
            title,
            time_minutes,
            price,
            link,
            tag_ids,
            ingredient_ids,
        })
    }

    /// Validate only the supplied fields (PATCH)
    pub fn into_changes(self) -> Result<RecipeChanges> {
        let title = match &self.title {
            Some(title) => Some(validation::required_text("title", Some(title.as_str()))?),
            None => None,
        };

        Ok(RecipeChanges {
            title,
            time_minutes: self
                .time_minutes
                .as_ref()
                .map(|v| non_negative_integer("time_minutes", v))
                .transpose()?,
            price: self.price.as_ref().map(price).transpose()?,
            link: validation::optional_text("link", self.link.as_deref())?,
            tag_ids: self.tags.as_ref().map(|v| id_list("tags", v)).transpose()?,
            ingredient_ids: self
                .ingredients
                .as_ref()
                .map(|v| id_list("ingredients", v))
                .transpose()?,
        })
    }
}

/// Query parameters for the recipe list
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    pub fn filter(&self) -> Result<RecipeFilter> {
        Ok(RecipeFilter {
            tag_ids: self
                .tags
                .as_deref()
                .map(|raw| query_id_list("tags", raw))
                .transpose()?,
            ingredient_ids: self
                .ingredients
                .as_deref()
                .map(|raw| query_id_list("ingredients", raw))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> RecipeRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_full_payload_requires_core_fields() {
        let input = request(json!({"title": "Cake", "time_minutes": 30, "price": "5.00"}))
            .into_input()
            .unwrap();
        assert_eq!(input.title, "Cake");
        assert_eq!(input.price.cents(), 500);
        assert!(input.tag_ids.is_empty());
        assert_eq!(input.link, "");

        assert!(request(json!({"time_minutes": 30, "price": 5})).into_input().is_err());
        assert!(request(json!({"title": "Cake", "price": 5})).into_input().is_err());
        assert!(request(json!({"title": "Cake", "time_minutes": 30})).into_input().is_err());
        assert!(request(json!({"title": "", "time_minutes": 30, "price": 5})).into_input().is_err());
    }

    #[test]
    fn test_partial_payload_keeps_absent_fields_unset() {
        let changes = request(json!({"tags": [3]})).into_changes().unwrap();
        assert_eq!(changes.tag_ids, Some(vec![3]));
        assert!(changes.title.is_none());
        assert!(changes.ingredient_ids.is_none());

        assert!(request(json!({"title": "  "})).into_changes().is_err());
        assert!(request(json!({"price": "12345.6"})).into_changes().is_err());
    }

    #[test]
    fn test_list_query_filter() {
        let query = RecipeListQuery {
            tags: Some("1,2".to_string()),
            ingredients: None,
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.tag_ids, Some(vec![1, 2]));
        assert!(filter.ingredient_ids.is_none());

        let bad = RecipeListQuery {
            tags: None,
            ingredients: Some("x".to_string()),
        };
        assert!(bad.filter().is_err());
    }
}
