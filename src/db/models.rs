//! Database models
//!
//! Data structures representing database tables

use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, Serializer};
use std::fmt;

/// Account record in the database
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: String,
}

/// Fields needed to insert an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Which owner-scoped name table a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub fn table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Join table linking recipes to this kind
    pub fn join_table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "recipe_tags",
            AttributeKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Foreign key column in the join table
    pub fn join_column(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_id",
            AttributeKind::Ingredient => "ingredient_id",
        }
    }

    /// Request/response field name, also used in error details
    pub fn field_name(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttributeKind::Tag => "Tag",
            AttributeKind::Ingredient => "Ingredient",
        }
    }
}

/// A tag or an ingredient: a name owned by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// Recipe record in the database
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    /// Path relative to the media root, e.g. `uploads/recipe/<uuid>.png`
    pub image: Option<String>,
    pub created_at: String,
}

/// Fields needed to insert a recipe
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
}

/// Non-negative decimal amount with at most 5 digits, 2 of them after the
/// point. Stored as integer cents, rendered as `"5.00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Price(i64);

lazy_static! {
    static ref PRICE_PATTERN: Regex = Regex::new(r"^(\d+)(?:\.(\d+))?$").unwrap();
}

impl Price {
    pub const MAX_CENTS: i64 = 99_999;

    pub fn from_cents(cents: i64) -> Result<Self, String> {
        if cents < 0 {
            return Err("Ensure this value is greater than or equal to 0.".to_string());
        }
        if cents > Self::MAX_CENTS {
            return Err("Ensure that there are no more than 5 digits in total.".to_string());
        }
        Ok(Price(cents))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// Parse a decimal string such as `"5"`, `"0.75"` or `"999.99"`
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.starts_with('-') {
            return Err("Ensure this value is greater than or equal to 0.".to_string());
        }

        let caps = PRICE_PATTERN
            .captures(input)
            .ok_or_else(|| "A valid number is required.".to_string())?;

        let whole = caps[1].trim_start_matches('0');
        let fraction = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let fraction = fraction.trim_end_matches('0');

        if fraction.len() > 2 {
            return Err("Ensure that there are no more than 2 decimal places.".to_string());
        }
        if whole.len() > 3 {
            return Err("Ensure that there are no more than 3 digits before the decimal point.".to_string());
        }

        let invalid = |_| "A valid number is required.".to_string();
        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(invalid)? };
        let fraction: i64 = format!("{:0<2}", fraction).parse().map_err(invalid)?;

        Self::from_cents(whole * 100 + fraction)
    }

    /// Accept either a JSON number or a decimal string
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Number(n) => Self::parse(&n.to_string()),
            _ => Err("A valid number is required.".to_string()),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl ToSql for Price {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Price {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Price)
    }
}
