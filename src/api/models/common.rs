//! Parsing helpers shared by request models
//!
//! JSON payloads are accepted loosely (numbers may arrive as strings, the way
//! form clients send them) and checked field by field so every failure maps to
//! a `{field: [message]}` error.

use crate::core::error::{ApiError, Result};
use serde_json::Value;

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// A primary key: a positive integer, or a string holding one
pub fn primary_key(field: &str, value: &Value) -> Result<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        other => {
            return Err(ApiError::field(
                field,
                format!("Incorrect type. Expected pk value, received {}.", json_type(other)),
            ))
        }
    };

    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::field(
            field,
            format!("Invalid pk \"{}\" - object does not exist.", value_text(value)),
        )),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A JSON list of primary keys
pub fn id_list(field: &str, value: &Value) -> Result<Vec<i64>> {
    match value {
        Value::Array(items) => items.iter().map(|item| primary_key(field, item)).collect(),
        other => Err(ApiError::field(
            field,
            format!("Expected a list of items but got type \"{}\".", json_type(other)),
        )),
    }
}

/// A non-negative whole number, or a string holding one
pub fn non_negative_integer(field: &str, value: &Value) -> Result<i64> {
    let invalid = || ApiError::field(field, "A valid integer is required.");

    let number = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                _ => return Err(invalid()),
            },
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if number < 0 {
        return Err(ApiError::field(
            field,
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(number)
}

/// A comma-separated id list from a query string, e.g. `tags=1,2,3`
pub fn query_id_list(field: &str, raw: &str) -> Result<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(ApiError::field(
                field,
                format!("\"{}\" is not a valid id.", part),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    if ids.is_empty() {
        return Err(ApiError::field(
            field,
            "Expected a comma-separated list of ids.",
        ));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_list() {
        assert_eq!(id_list("tags", &json!([1, "2"])).unwrap(), vec![1, 2]);
        assert!(id_list("tags", &json!([])).unwrap().is_empty());
        assert!(id_list("tags", &json!("1,2")).is_err());
        assert!(id_list("tags", &json!([0])).is_err());
        assert!(id_list("tags", &json!([true])).is_err());
    }

    #[test]
    fn test_non_negative_integer() {
        assert_eq!(non_negative_integer("time_minutes", &json!(10)).unwrap(), 10);
        assert_eq!(non_negative_integer("time_minutes", &json!("25")).unwrap(), 25);
        assert_eq!(non_negative_integer("time_minutes", &json!(30.0)).unwrap(), 30);
        assert!(non_negative_integer("time_minutes", &json!(1.5)).is_err());
        assert!(non_negative_integer("time_minutes", &json!(-1)).is_err());
        assert!(non_negative_integer("time_minutes", &json!("soon")).is_err());
    }

    #[test]
    fn test_query_id_list() {
        assert_eq!(query_id_list("tags", "3,1").unwrap(), vec![3, 1]);
        assert_eq!(query_id_list("tags", " 4 , 5,").unwrap(), vec![4, 5]);
        assert!(query_id_list("tags", "").is_err());
        assert!(query_id_list("tags", "1,abc").is_err());
        assert!(query_id_list("tags", "-2").is_err());
    }
}
