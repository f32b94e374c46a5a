//! Database module
//!
//! This module provides database management functionality including:
//! - Database connection pool management
//! - Owner-scoped repositories for accounts, tokens, tags, ingredients and recipes
//! - Database migrations
//! - Data models and schemas

pub mod manager;
pub mod models;
pub mod repository;
pub mod migrations;

pub use manager::DatabaseManager;
pub use models::{Attribute, AttributeKind, NewRecipe, NewUser, Price, Recipe, User};
pub use repository::{
    AttributeRepository, OwnedRepository, RecipeFilter, RecipeRepository, TokenRepository,
    UserRepository,
};
