//! Error types for pesticide operations.
//!
//! Every failure maps onto one [`ErrorKind`]; transports use the kind to pick
//! a status code and decide whether the message is safe to show to clients.

use crate::auth::Capability;
use crate::id_generation::IdGenerationError;
use crate::validation::FieldErrors;
use std::io;
use thiserror::Error;

/// The error type for pesticide operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// The caller could not be identified.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The caller is known but lacks the required capability.
    #[error("Unauthorized: {0} required")]
    Authorization(Capability),

    /// Issue not found.
    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The request clashes with existing data or the issue's state.
    #[error("{message}")]
    Conflict {
        /// The input field the conflict is reported against.
        field: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// Signing a bearer token failed.
    #[error("Token error: {0}")]
    Token(#[source] jsonwebtoken::errors::Error),
}

/// Coarse classification of [`Error`] for transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input fields.
    Validation,
    /// Missing or invalid credential.
    Authentication,
    /// Authenticated but insufficient privilege.
    Authorization,
    /// No matching entity.
    NotFound,
    /// Duplicate name, or action invalid for the current state.
    Conflict,
    /// Unexpected failure; details must not leak to clients.
    Internal,
}

impl Error {
    /// Classifies this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::IssueNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::Storage(_) | Self::Token(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Conflict raised when commenting on a resolved issue.
    pub(crate) fn issue_closed() -> Self {
        Self::Conflict {
            field: "issue",
            message: "This issue is closed!".to_string(),
        }
    }

    /// Conflict raised when a category or project name is already taken.
    pub(crate) fn duplicate_title(entity: &str) -> Self {
        Self::Conflict {
            field: "title",
            message: format!("A {entity} with this title already exists!"),
        }
    }

    /// Conflict raised when a new issue would reuse an existing tag.
    pub(crate) fn duplicate_tag(tag: &str) -> Self {
        Self::Conflict {
            field: "tag",
            message: format!("Issue tag {tag} is already in use"),
        }
    }
}

/// Errors raised while locating, reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.pesticide` directory above the working directory.
    #[error("Not a pesticide workspace (no .pesticide directory found). Run 'pesticide init' first")]
    NotInitialized,

    /// `init` was run where a workspace already exists.
    #[error("Pesticide is already initialized here. Found existing '{0}'")]
    AlreadyInitialized(String),

    /// A configuration value is out of range or malformed.
    #[error("{0}")]
    Invalid(String),

    /// The YAML file could not be parsed or written.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing a JSONL data file failed.
    #[error("JSONL error: {0}")]
    Jsonl(#[from] pesticide_jsonl::Error),

    /// A new identifier could not be allocated.
    #[error("ID generation failed: {0}")]
    IdGeneration(#[from] IdGenerationError),

    /// The configured backend name is not recognised.
    #[error("Unknown storage backend '{0}'. Valid values: memory, jsonl")]
    UnknownBackend(String),

    /// An update targeted a record that does not exist.
    #[error("Record not found: {0}")]
    MissingRecord(String),
}

/// A specialized Result type for pesticide operations.
pub type Result<T> = std::result::Result<T, Error>;
