use crate::core::error::{ApiError, Result};
use crate::db::models::Attribute;
use serde::{Deserialize, Serialize};

/// A tag or ingredient as returned by the API
#[derive(Debug, Serialize, PartialEq)]
pub struct AttributeResponse {
    pub id: i64,
    pub name: String,
}

impl From<Attribute> for AttributeResponse {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateAttributeRequest {
    pub name: Option<String>,
}

/// Query parameters for tag and ingredient lists
#[derive(Debug, Default, Deserialize)]
pub struct AttributeListQuery {
    pub assigned_only: Option<String>,
}

impl AttributeListQuery {
    /// `assigned_only` is an integer flag; any non-zero value restricts the list
    pub fn assigned_only(&self) -> Result<bool> {
        match self.assigned_only.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some(raw) => raw
                .parse::<i64>()
                .map(|flag| flag != 0)
                .map_err(|_| ApiError::field("assigned_only", "A valid integer is required.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(value: Option<&str>) -> AttributeListQuery {
        AttributeListQuery {
            assigned_only: value.map(str::to_string),
        }
    }

    #[test]
    fn test_assigned_only_flag() {
        assert!(!query(None).assigned_only().unwrap());
        assert!(!query(Some("0")).assigned_only().unwrap());
        assert!(query(Some("1")).assigned_only().unwrap());
        assert!(query(Some("yes")).assigned_only().is_err());
    }
}
