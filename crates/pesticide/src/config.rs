//! Workspace configuration.
//!
//! A pesticide workspace is a directory containing `.pesticide/config.yaml`:
//!
//! ```yaml
//! issue-prefix: PST-
//! storage:
//!   backend: jsonl
//!   data-dir: .pesticide/data
//! auth:
//!   jwt-secret: 3f9c...
//!   token-ttl-hours: 24
//! server:
//!   bind: 127.0.0.1:5000
//! ```
//!
//! `PESTICIDE_JWT_SECRET` overrides `auth.jwt-secret` when set.

use crate::error::{ConfigError, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default tag prefix
pub const DEFAULT_PREFIX: &str = "PST-";

/// Name of the workspace directory
pub const PESTICIDE_DIR_NAME: &str = ".pesticide";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the data directory inside the workspace directory
pub const DATA_DIR_NAME: &str = "data";

/// Environment variable overriding the token secret
pub const JWT_SECRET_ENV: &str = "PESTICIDE_JWT_SECRET";

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default bearer token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct PesticideConfig {
    /// Prefix of issue tags (e.g. "PST-" for "PST-12")
    pub issue_prefix: String,

    /// Storage section
    pub storage: StorageConfig,

    /// Token signing section
    pub auth: AuthConfig,

    /// HTTP server section
    #[serde(default)]
    pub server: ServerConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// `memory` or `jsonl`
    pub backend: String,

    /// Data directory, relative to the workspace root
    pub data_dir: String,
}

impl StorageConfig {
    /// Resolves this section into a backend rooted at `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown backend name.
    pub fn to_backend(&self, root_dir: &Path) -> Result<StorageBackend> {
        match self.backend.as_str() {
            "memory" => Ok(StorageBackend::InMemory),
            "jsonl" => Ok(StorageBackend::Jsonl(root_dir.join(&self.data_dir))),
            other => Err(crate::error::StorageError::UnknownBackend(other.to_string()).into()),
        }
    }
}

/// Token signing section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AuthConfig {
    /// HMAC secret for bearer tokens
    pub jwt_secret: String,

    /// Lifetime of minted tokens
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    /// The secret in effect: the environment override if set, else the file value.
    #[must_use]
    pub fn resolved_secret(&self) -> String {
        std::env::var(JWT_SECRET_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.jwt_secret.clone())
    }
}

fn default_token_ttl_hours() -> i64 {
    DEFAULT_TOKEN_TTL_HOURS
}

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl PesticideConfig {
    /// Create a configuration with the given prefix and secret, persisting to JSONL.
    #[must_use]
    pub fn new(prefix: &str, jwt_secret: &str) -> Self {
        Self {
            issue_prefix: prefix.to_string(),
            storage: StorageConfig {
                backend: "jsonl".to_string(),
                data_dir: format!("{PESTICIDE_DIR_NAME}/{DATA_DIR_NAME}"),
            },
            auth: AuthConfig {
                jwt_secret: jwt_secret.to_string(),
                token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            },
            server: ServerConfig::default(),
        }
    }

    /// Load and validate configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(ConfigError::from)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.issue_prefix)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "auth.token-ttl-hours must be between 1 and {MAX_TOKEN_TTL_HOURS}"
            ))
            .into());
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.data-dir must not be empty".to_string()).into());
        }
        Ok(())
    }
}

/// Validate the issue tag prefix.
///
/// Requirements:
/// - 1-20 characters
/// - starts with an ASCII letter
/// - ASCII letters, digits, `-` and `_` only
///
/// Expects pre-trimmed input.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] describing the violated rule.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(ConfigError::Invalid("Prefix must not be empty".to_string()).into());
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if !prefix.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Invalid("Prefix must start with a letter".to_string()).into());
    }

    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Invalid(
            "Prefix must contain only letters, digits, '-' or '_'".to_string(),
        )
        .into());
    }

    Ok(())
}

/// Check if a directory holds a pesticide workspace.
#[must_use]
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(PESTICIDE_DIR_NAME).exists()
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.pesticide/`, or `None` if none is
/// found within [`MAX_TRAVERSAL_DEPTH`] levels.
#[must_use]
pub fn find_workspace_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(PESTICIDE_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
