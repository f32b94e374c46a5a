//! Field validation shared by the account and recipe endpoints
//!
//! Every failure is an `ApiError::InvalidField` so clients get
//! `{field: [message]}` details.

use crate::core::error::{ApiError, Result};
use lazy_static::lazy_static;
use regex::Regex;

/// Longest accepted name, title, link or email
pub const MAX_TEXT_LENGTH: usize = 255;

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    )
    .unwrap();
}

pub fn required(field: &str) -> ApiError {
    ApiError::field(field, "This field is required.")
}

/// A required, non-blank string of at most `MAX_TEXT_LENGTH` chars, trimmed
pub fn required_text(field: &str, value: Option<&str>) -> Result<String> {
    let value = value.ok_or_else(|| required(field))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::field(field, "This field may not be blank."));
    }
    max_length(field, value)?;
    Ok(value.to_string())
}

/// An optional string that may be blank, trimmed
pub fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>> {
    match value {
        Some(value) => {
            let value = value.trim();
            max_length(field, value)?;
            Ok(Some(value.to_string()))
        }
        None => Ok(None),
    }
}

fn max_length(field: &str, value: &str) -> Result<()> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ApiError::field(
            field,
            format!("Ensure this field has no more than {} characters.", MAX_TEXT_LENGTH),
        ));
    }
    Ok(())
}

/// Trim and lowercase the domain part; the local part keeps its case
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Validate and normalise a required email field
pub fn email(value: Option<&str>) -> Result<String> {
    let value = required_text("email", value)?;
    let value = normalize_email(&value);
    if !EMAIL_PATTERN.is_match(&value) {
        return Err(ApiError::field("email", "Enter a valid email address."));
    }
    Ok(value)
}

/// bcrypt only hashes the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Passwords are taken verbatim; only the length is checked
pub fn password(value: Option<&str>, min_length: usize) -> Result<String> {
    let value = value.ok_or_else(|| required("password"))?;
    if value.is_empty() {
        return Err(ApiError::field("password", "This field may not be blank."));
    }
    if value.chars().count() < min_length {
        return Err(ApiError::field(
            "password",
            format!("Ensure this field has at least {} characters.", min_length),
        ));
    }
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(ApiError::field(
            "password",
            format!("Ensure this field has no more than {} bytes.", MAX_PASSWORD_BYTES),
        ));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ApiError) -> String {
        match err {
            ApiError::InvalidField { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email("  Cook@EXAMPLE.Com "), "Cook@example.com");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_email_validation() {
        assert_eq!(email(Some("test@Example.com")).unwrap(), "test@example.com");
        assert_eq!(field_of(email(Some("not-an-email")).unwrap_err()), "email");
        assert_eq!(field_of(email(Some("a@b")).unwrap_err()), "email");
        assert_eq!(field_of(email(None).unwrap_err()), "email");
        assert_eq!(field_of(email(Some("   ")).unwrap_err()), "email");
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", Some("  Vegan ")).unwrap(), "Vegan");
        assert!(required_text("name", Some("")).is_err());
        assert!(required_text("name", Some("   ")).is_err());
        assert!(required_text("name", None).is_err());
        assert!(required_text("name", Some(&"x".repeat(256))).is_err());
        assert!(required_text("name", Some(&"x".repeat(255))).is_ok());
    }

    #[test]
    fn test_password_length() {
        assert!(password(Some("pw"), 5).is_err());
        assert!(password(Some("pass1"), 5).is_ok());
        assert!(password(None, 5).is_err());
        assert_eq!(password(Some(" padded "), 5).unwrap(), " padded ");
    }

    #[test]
    fn test_password_within_bcrypt_limit() {
        assert!(password(Some(&"a".repeat(72)), 5).is_ok());
        let err = password(Some(&"a".repeat(73)), 5).unwrap_err();
        assert_eq!(field_of(err), "password");
        // Multi-byte characters count by encoded size
        assert!(password(Some(&"é".repeat(37)), 5).is_err());
    }
}
