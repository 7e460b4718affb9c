//! Request payloads for lifecycle operations.
//!
//! Missing fields deserialize to empty values so a single validation pass can
//! report them alongside every other problem with the input.

use super::{CategoryId, NewIssue, ProjectId};
use crate::validation::{
    FieldErrors, MAX_CATALOG_NAME_LENGTH, MAX_COMMENT_LENGTH, MAX_NAME_LENGTH, MAX_TEXT_LENGTH,
};
use serde::Deserialize;

/// Fields for filing a new issue.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewIssueInput {
    /// Issue title (required)
    pub name: String,
    /// Issue description (required)
    pub description: String,
    /// Steps to reproduce
    pub reproduction: Option<String>,
    /// Captured stack trace
    pub stack_trace: Option<String>,
    /// Category id
    pub category: Option<CategoryId>,
    /// Project id
    pub project: Option<ProjectId>,
    /// Hide from non-privileged viewers
    pub is_private: bool,
}

impl NewIssueInput {
    /// Checks required fields and length limits.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", "Name", &self.name);
        errors.max_length("name", "Name", &self.name, MAX_NAME_LENGTH);
        errors.require("description", "Description", &self.description);
        errors.max_length("description", "Description", &self.description, MAX_TEXT_LENGTH);
        errors.max_length_opt(
            "reproduction",
            "Reproduction",
            self.reproduction.as_deref(),
            MAX_TEXT_LENGTH,
        );
        errors.max_length_opt(
            "stackTrace",
            "Stack trace",
            self.stack_trace.as_deref(),
            MAX_TEXT_LENGTH,
        );
        errors
    }

    /// Normalizes the input into a storable draft; blank optionals become `None`.
    #[must_use]
    pub fn into_new_issue(self, tag: String) -> NewIssue {
        NewIssue {
            tag,
            name: self.name.trim().to_string(),
            description: self.description,
            reproduction: non_blank(self.reproduction),
            stack_trace: non_blank(self.stack_trace),
            category: self.category.filter(|id| !id.is_blank()),
            project: self.project.filter(|id| !id.is_blank()),
            is_private: self.is_private,
        }
    }
}

/// A comment body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewCommentInput {
    /// Comment text
    pub comment: String,
}

impl NewCommentInput {
    /// Checks the comment is present and within the length limit.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("comment", "Comment", &self.comment);
        errors.max_length("comment", "Comment", &self.comment, MAX_COMMENT_LENGTH);
        errors
    }
}

/// Resolution notes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveInput {
    /// Developer notes recorded on the issue
    pub dev_notes: Option<String>,
}

impl ResolveInput {
    /// Caps the notes at the free-text limit.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.max_length_opt("devNotes", "Dev notes", self.dev_notes.as_deref(), MAX_TEXT_LENGTH);
        errors
    }

    /// Notes with blank input dropped.
    #[must_use]
    pub fn into_notes(self) -> Option<String> {
        non_blank(self.dev_notes)
    }
}

/// Payload for creating a category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCategoryInput {
    /// Category name
    pub category_name: String,
}

impl NewCategoryInput {
    /// Checks the name is present and short enough.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        validate_catalog_name("categoryName", "Category name", &self.category_name)
    }
}

/// Payload for creating a project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewProjectInput {
    /// Project name
    pub name: String,
}

impl NewProjectInput {
    /// Checks the name is present and short enough.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        validate_catalog_name("name", "Name", &self.name)
    }
}

fn validate_catalog_name(field: &str, label: &str, value: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.require(field, label, value);
    errors.max_length(field, label, value.trim(), MAX_CATALOG_NAME_LENGTH);
    errors
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
