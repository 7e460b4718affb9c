//! Field-level input validation.
//!
//! Every input struct runs a single validation pass that collects one message
//! per offending field into a [`FieldErrors`] map. The map serializes as a flat
//! JSON object (`{"name": "Name field is required"}`) so transports can return
//! it unchanged.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Maximum length of an issue name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of free-text issue fields (description, reproduction, stack trace, dev notes).
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Maximum length of a comment.
pub const MAX_COMMENT_LENGTH: usize = 5_000;

/// Maximum length of a category or project name.
pub const MAX_CATALOG_NAME_LENGTH: usize = 100;

/// Maximum length of a username.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Validation failures keyed by input field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates an empty error map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map holding a single failure.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Records a failure for `field`. The first message recorded for a field wins.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Returns the message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns `true` when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Converts the collected failures into a [`Result`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when at least one field failed.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }

    /// Requires `value` to contain something other than whitespace.
    pub(crate) fn require(&mut self, field: &str, label: &str, value: &str) {
        if value.trim().is_empty() {
            self.insert(field, format!("{label} field is required"));
        }
    }

    /// Caps `value` at `max` characters.
    pub(crate) fn max_length(&mut self, field: &str, label: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.insert(field, format!("{label} must be at most {max} characters"));
        }
    }

    /// Caps an optional value at `max` characters.
    pub(crate) fn max_length_opt(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&str>,
        max: usize,
    ) {
        if let Some(value) = value {
            self.max_length(field, label, value, max);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.require("name", "Name", "   ");
        errors.max_length("name", "Name", &"x".repeat(300), MAX_NAME_LENGTH);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name"), Some("Name field is required"));
    }

    #[test]
    fn max_length_counts_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        errors.max_length("name", "Name", &"é".repeat(MAX_NAME_LENGTH), MAX_NAME_LENGTH);
        assert!(errors.is_empty());

        errors.max_length("name", "Name", &"é".repeat(MAX_NAME_LENGTH + 1), MAX_NAME_LENGTH);
        assert_eq!(errors.get("name"), Some("Name must be at most 200 characters"));
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut errors = FieldErrors::new();
        errors.require("description", "Description", "");
        errors.require("name", "Name", "");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "description": "Description field is required",
                "name": "Name field is required",
            })
        );
        assert_eq!(
            errors.to_string(),
            "description: Description field is required; name: Name field is required"
        );
    }

    #[test]
    fn into_result_only_fails_when_non_empty() {
        assert!(FieldErrors::new().into_result().is_ok());
        let err = FieldErrors::single("body", "Invalid JSON")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref e) if e.get("body") == Some("Invalid JSON")));
    }
}
