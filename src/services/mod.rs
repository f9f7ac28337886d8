//! Resource collections: validation and persistence for each entity.

pub mod admins;
pub mod emails;
pub mod pagination;
pub mod projects;
pub mod settings;
pub mod techstack;

use regex::Regex;

use crate::error::AppError;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Rejects with the names of every field that is absent or blank.
pub(crate) fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Trimmed copy of a field already checked by [`require_fields`].
pub(crate) fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn test_require_fields_lists_every_missing_field() {
        let err = require_fields(&[
            ("title", Some("Site")),
            ("description", None),
            ("category", Some("   ")),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: description, category"
        );
    }

    #[test]
    fn test_require_fields_passes_when_present() {
        assert!(require_fields(&[("name", Some("React"))]).is_ok());
    }
}
