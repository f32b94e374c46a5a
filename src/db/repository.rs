//! Repository pattern implementation for data access layer
//!
//! Every query that touches tags, ingredients or recipes takes the owner's id
//! and filters on it; a record owned by someone else is indistinguishable from
//! one that does not exist.

use crate::core::error::{ApiError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{Attribute, AttributeKind, NewRecipe, NewUser, Recipe, User};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to records that belong to a single user
#[async_trait]
pub trait OwnedRepository<T>: Send + Sync {
    /// Find a record by id, only if `owner_id` owns it
    async fn find_owned(&self, owner_id: i64, id: i64) -> Result<Option<T>>;

    /// All records owned by `owner_id`, in the repository's canonical order
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<T>>;
}

/// `?, ?, ?` for an IN clause of `n` values
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

const USER_COLUMNS: &str =
    "u.id, u.email, u.name, u.password_hash, u.is_active, u.is_staff, u.created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        is_active: row.get(4)?,
        is_staff: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn email_taken() -> ApiError {
    ApiError::field("email", "user with this email already exists.")
}

/// Repository for accounts
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS),
                        [id],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    /// Find an account by its (already normalised) email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {} FROM users u WHERE u.email = ?", USER_COLUMNS),
                        [&email],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    /// Insert an account; a duplicate email is a validation error
    pub async fn create(&self, user: &NewUser) -> Result<User> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                let created_at = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO users (email, name, password_hash, is_active, is_staff, created_at) \
                     VALUES (?, ?, ?, 1, ?, ?)",
                    params![&user.email, &user.name, &user.password_hash, user.is_staff, &created_at],
                )
                .map_err(|e| if is_unique_violation(&e) { email_taken() } else { e.into() })?;

                Ok(User {
                    id: conn.last_insert_rowid(),
                    email: user.email,
                    name: user.name,
                    password_hash: user.password_hash,
                    is_active: true,
                    is_staff: user.is_staff,
                    created_at,
                })
            })
            .await
    }

    /// Persist email, name, password hash and flags
    pub async fn update(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE users SET email = ?, name = ?, password_hash = ?, is_active = ?, is_staff = ? \
                     WHERE id = ?",
                    params![
                        &user.email,
                        &user.name,
                        &user.password_hash,
                        user.is_active,
                        user.is_staff,
                        user.id
                    ],
                )
                .map_err(|e| if is_unique_violation(&e) { email_taken() } else { e.into() })?;
                Ok(())
            })
            .await
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64> {
        self.db
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .await
    }
}

// ---------------------------------------------------------------------------
// Auth tokens
// ---------------------------------------------------------------------------

/// Repository for bearer tokens; only digests are stored
pub struct TokenRepository {
    db: Arc<DatabaseManager>,
}

impl TokenRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Replace the user's token with `key_hash`
    pub async fn rotate(&self, user_id: i64, key_hash: &str) -> Result<()> {
        let key_hash = key_hash.to_string();
        self.db
            .transaction(move |tx| {
                tx.execute("DELETE FROM auth_tokens WHERE user_id = ?", [user_id])?;
                tx.execute(
                    "INSERT INTO auth_tokens (key_hash, user_id, created_at) VALUES (?, ?, ?)",
                    params![&key_hash, user_id, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
    }

    /// Resolve a token digest to its active owner
    pub async fn find_user(&self, key_hash: &str) -> Result<Option<User>> {
        let key_hash = key_hash.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!(
                            "SELECT {} FROM auth_tokens t JOIN users u ON u.id = t.user_id \
                             WHERE t.key_hash = ? AND u.is_active = 1",
                            USER_COLUMNS
                        ),
                        [&key_hash],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Tags and ingredients
// ---------------------------------------------------------------------------

fn attribute_from_row(row: &Row<'_>) -> rusqlite::Result<Attribute> {
    Ok(Attribute {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
    })
}

/// Fail with a field error naming the first id in `ids` that `owner_id` does not own
fn ensure_owned(conn: &Connection, kind: AttributeKind, owner_id: i64, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE user_id = ? AND id IN ({})",
        kind.table(),
        placeholders(ids.len())
    ))?;
    let params = std::iter::once(owner_id).chain(ids.iter().copied());
    let owned = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, i64>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    match ids.iter().find(|id| !owned.contains(id)) {
        Some(missing) => Err(ApiError::field(
            kind.field_name(),
            format!("Invalid pk \"{}\" - object does not exist.", missing),
        )),
        None => Ok(()),
    }
}

/// Overwrite a recipe's links of one kind with `ids`
fn replace_links(conn: &Connection, kind: AttributeKind, recipe_id: i64, ids: &[i64]) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE recipe_id = ?", kind.join_table()),
        [recipe_id],
    )?;

    let mut stmt = conn.prepare(&format!(
        "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?, ?)",
        kind.join_table(),
        kind.join_column()
    ))?;
    for id in ids {
        stmt.execute([recipe_id, *id])?;
    }

    Ok(())
}

/// Repository for tags or ingredients, depending on `kind`
pub struct AttributeRepository {
    db: Arc<DatabaseManager>,
    kind: AttributeKind,
}

impl AttributeRepository {
    pub fn new(db: Arc<DatabaseManager>, kind: AttributeKind) -> Self {
        Self { db, kind }
    }

    pub async fn create(&self, owner_id: i64, name: &str) -> Result<Attribute> {
        let name = name.to_string();
        let table = self.kind.table();
        self.db
            .execute(move |conn| {
                conn.execute(
                    &format!("INSERT INTO {} (user_id, name) VALUES (?, ?)", table),
                    params![owner_id, &name],
                )?;
                Ok(Attribute {
                    id: conn.last_insert_rowid(),
                    user_id: owner_id,
                    name,
                })
            })
            .await
    }

    /// Records referenced by at least one of the owner's recipes, each once
    pub async fn list_assigned_to_recipes(&self, owner_id: i64) -> Result<Vec<Attribute>> {
        let kind = self.kind;
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT DISTINCT a.id, a.user_id, a.name FROM {table} a \
                     JOIN {join} j ON j.{column} = a.id \
                     JOIN recipes r ON r.id = j.recipe_id \
                     WHERE a.user_id = ? AND r.user_id = ? \
                     ORDER BY a.name DESC, a.id DESC",
                    table = kind.table(),
                    join = kind.join_table(),
                    column = kind.join_column(),
                ))?;
                let rows = stmt
                    .query_map([owner_id, owner_id], attribute_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Records linked to one recipe, for nested detail views
    pub async fn for_recipe(&self, recipe_id: i64) -> Result<Vec<Attribute>> {
        let kind = self.kind;
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT a.id, a.user_id, a.name FROM {table} a \
                     JOIN {join} j ON j.{column} = a.id \
                     WHERE j.recipe_id = ? ORDER BY a.id",
                    table = kind.table(),
                    join = kind.join_table(),
                    column = kind.join_column(),
                ))?;
                let rows = stmt
                    .query_map([recipe_id], attribute_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Linked ids for a batch of recipes, keyed by recipe id
    pub async fn ids_by_recipe(&self, recipe_ids: Vec<i64>) -> Result<HashMap<i64, Vec<i64>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let kind = self.kind;
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT recipe_id, {column} FROM {join} WHERE recipe_id IN ({ids}) \
                     ORDER BY recipe_id, {column}",
                    column = kind.join_column(),
                    join = kind.join_table(),
                    ids = placeholders(recipe_ids.len()),
                ))?;

                let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
                let rows = stmt.query_map(params_from_iter(recipe_ids.iter()), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (recipe_id, id) = row?;
                    links.entry(recipe_id).or_default().push(id);
                }
                Ok(links)
            })
            .await
    }
}

#[async_trait]
impl OwnedRepository<Attribute> for AttributeRepository {
    async fn find_owned(&self, owner_id: i64, id: i64) -> Result<Option<Attribute>> {
        let table = self.kind.table();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT id, user_id, name FROM {} WHERE id = ? AND user_id = ?", table),
                        [id, owner_id],
                        attribute_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Attribute>> {
        let table = self.kind.table();
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT id, user_id, name FROM {} WHERE user_id = ? ORDER BY name DESC, id DESC",
                    table
                ))?;
                let rows = stmt
                    .query_map([owner_id], attribute_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

const RECIPE_COLUMNS: &str =
    "r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image, r.created_at";

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        time_minutes: row.get(3)?,
        price: row.get(4)?,
        link: row.get(5)?,
        image: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn load_recipe(conn: &Connection, id: i64) -> Result<Recipe> {
    Ok(conn.query_row(
        &format!("SELECT {} FROM recipes r WHERE r.id = ?", RECIPE_COLUMNS),
        [id],
        recipe_from_row,
    )?)
}

/// Recipe list restrictions; ids within one list are OR-combined, the two
/// lists are AND-combined
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

impl RecipeFilter {
    fn ids(&self, kind: AttributeKind) -> Option<&Vec<i64>> {
        match kind {
            AttributeKind::Tag => self.tag_ids.as_ref(),
            AttributeKind::Ingredient => self.ingredient_ids.as_ref(),
        }
    }
}

/// Repository for recipes and their tag/ingredient links
pub struct RecipeRepository {
    db: Arc<DatabaseManager>,
}

impl RecipeRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// The owner's recipes, newest id first, restricted by `filter`
    pub async fn list_filtered(&self, owner_id: i64, filter: RecipeFilter) -> Result<Vec<Recipe>> {
        self.db
            .execute(move |conn| {
                let mut query = format!("SELECT {} FROM recipes r WHERE r.user_id = ?", RECIPE_COLUMNS);
                let mut params: Vec<i64> = vec![owner_id];

                for kind in [AttributeKind::Tag, AttributeKind::Ingredient] {
                    if let Some(ids) = filter.ids(kind) {
                        if ids.is_empty() {
                            return Ok(Vec::new());
                        }
                        query += &format!(
                            " AND EXISTS (SELECT 1 FROM {join} j WHERE j.recipe_id = r.id AND j.{column} IN ({ids}))",
                            join = kind.join_table(),
                            column = kind.join_column(),
                            ids = placeholders(ids.len()),
                        );
                        params.extend(ids.iter().copied());
                    }
                }

                query += " ORDER BY r.id DESC";

                let mut stmt = conn.prepare(&query)?;
                let recipes = stmt
                    .query_map(params_from_iter(params.iter()), recipe_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(recipes)
            })
            .await
    }

    /// Insert a recipe with its links; every linked id must belong to the owner
    pub async fn create(
        &self,
        recipe: NewRecipe,
        tag_ids: Vec<i64>,
        ingredient_ids: Vec<i64>,
    ) -> Result<Recipe> {
        self.db
            .transaction(move |tx| {
                ensure_owned(tx, AttributeKind::Tag, recipe.user_id, &tag_ids)?;
                ensure_owned(tx, AttributeKind::Ingredient, recipe.user_id, &ingredient_ids)?;

                tx.execute(
                    "INSERT INTO recipes (user_id, title, time_minutes, price, link, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                    params![
                        recipe.user_id,
                        &recipe.title,
                        recipe.time_minutes,
                        recipe.price,
                        &recipe.link,
                        chrono::Utc::now().to_rfc3339()
                    ],
                )?;
                let id = tx.last_insert_rowid();

                replace_links(tx, AttributeKind::Tag, id, &tag_ids)?;
                replace_links(tx, AttributeKind::Ingredient, id, &ingredient_ids)?;

                load_recipe(tx, id)
            })
            .await
    }

    /// Save scalar fields; a `Some` link list replaces that whole set
    pub async fn update(
        &self,
        recipe: Recipe,
        tag_ids: Option<Vec<i64>>,
        ingredient_ids: Option<Vec<i64>>,
    ) -> Result<Recipe> {
        self.db
            .transaction(move |tx| {
                if let Some(ids) = &tag_ids {
                    ensure_owned(tx, AttributeKind::Tag, recipe.user_id, ids)?;
                }
                if let Some(ids) = &ingredient_ids {
                    ensure_owned(tx, AttributeKind::Ingredient, recipe.user_id, ids)?;
                }

                let changed = tx.execute(
                    "UPDATE recipes SET title = ?, time_minutes = ?, price = ?, link = ? \
                     WHERE id = ? AND user_id = ?",
                    params![
                        &recipe.title,
                        recipe.time_minutes,
                        recipe.price,
                        &recipe.link,
                        recipe.id,
                        recipe.user_id
                    ],
                )?;
                if changed == 0 {
                    return Err(ApiError::NotFound(format!("Recipe {} not found", recipe.id)));
                }

                if let Some(ids) = &tag_ids {
                    replace_links(tx, AttributeKind::Tag, recipe.id, ids)?;
                }
                if let Some(ids) = &ingredient_ids {
                    replace_links(tx, AttributeKind::Ingredient, recipe.id, ids)?;
                }

                load_recipe(tx, recipe.id)
            })
            .await
    }

    /// Point an owned recipe at a new image path (relative to the media root)
    pub async fn set_image(&self, owner_id: i64, recipe_id: i64, image: Option<String>) -> Result<()> {
        self.db
            .execute(move |conn| {
                let changed = conn.execute(
                    "UPDATE recipes SET image = ? WHERE id = ? AND user_id = ?",
                    params![image, recipe_id, owner_id],
                )?;
                if changed == 0 {
                    return Err(ApiError::NotFound(format!("Recipe {} not found", recipe_id)));
                }
                Ok(())
            })
            .await
    }

    /// Delete an owned recipe; links go with it. Returns false if nothing matched.
    pub async fn delete(&self, owner_id: i64, recipe_id: i64) -> Result<bool> {
        self.db
            .execute(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM recipes WHERE id = ? AND user_id = ?",
                    [recipe_id, owner_id],
                )?;
                Ok(deleted > 0)
            })
            .await
    }
}

#[async_trait]
impl OwnedRepository<Recipe> for RecipeRepository {
    async fn find_owned(&self, owner_id: i64, id: i64) -> Result<Option<Recipe>> {
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!(
                            "SELECT {} FROM recipes r WHERE r.id = ? AND r.user_id = ?",
                            RECIPE_COLUMNS
                        ),
                        [id, owner_id],
                        recipe_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Recipe>> {
        self.list_filtered(owner_id, RecipeFilter::default()).await
    }
}
