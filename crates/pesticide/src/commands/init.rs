//! Implementation of the `init` command.
//!
//! Creates the `.pesticide/` directory with a configuration file carrying a
//! freshly generated token secret, an empty data directory and a `.gitignore`
//! that keeps both out of version control.

use crate::config::{
    CONFIG_FILE_NAME, DATA_DIR_NAME, DEFAULT_PREFIX, PESTICIDE_DIR_NAME, PesticideConfig,
    validate_prefix,
};
use crate::error::{ConfigError, Result};
use rand::Rng;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within .pesticide
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created .pesticide directory
    pub pesticide_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created data directory
    pub data_dir: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
    /// The tag prefix in effect
    pub prefix: String,
}

/// Initialize a new workspace in `base_dir`.
///
/// # Errors
///
/// Returns an error if:
/// - `.pesticide/` already exists
/// - the prefix is invalid
/// - file system operations fail
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let pesticide_dir = base_dir.join(PESTICIDE_DIR_NAME);
    if pesticide_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(PESTICIDE_DIR_NAME.to_string()).into());
    }

    let data_dir = pesticide_dir.join(DATA_DIR_NAME);
    fs::create_dir_all(&data_dir).await?;

    let config_file = pesticide_dir.join(CONFIG_FILE_NAME);
    let config = PesticideConfig::new(prefix, &generate_secret());
    config.save(&config_file).await?;

    let gitignore_file = pesticide_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# Pesticide configuration holds the token secret
config.yaml
data/
";
    fs::write(&gitignore_file, gitignore_content).await?;

    tracing::info!(dir = %pesticide_dir.display(), prefix, "Initialized pesticide workspace");

    Ok(InitResult {
        pesticide_dir,
        config_file,
        data_dir,
        gitignore_file,
        prefix: prefix.to_string(),
    })
}

/// Number of random bytes in a generated token secret.
const SECRET_BYTES: usize = 32;

/// 64 hex characters from the thread-local CSPRNG.
fn generate_secret() -> String {
    let bytes: [u8; SECRET_BYTES] = rand::rng().random();
    bytes
        .iter()
        .fold(String::with_capacity(SECRET_BYTES * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_directory_structure() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).await.unwrap();

        assert!(result.pesticide_dir.exists());
        assert!(result.config_file.exists());
        assert!(result.data_dir.is_dir());
        assert!(result.gitignore_file.exists());
        assert_eq!(result.prefix, DEFAULT_PREFIX);
    }

    #[tokio::test]
    async fn test_init_writes_prefix_and_secret() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some(" BUG- ")).await.unwrap();
        assert_eq!(result.prefix, "BUG-");

        let config = PesticideConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config.issue_prefix, "BUG-");
        assert_eq!(config.auth.jwt_secret.len(), 64);
        assert!(config.auth.jwt_secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();

        let err = init(temp_dir.path(), None).await.unwrap_err().to_string();
        assert!(err.to_lowercase().contains("already initialized"));
    }

    #[tokio::test]
    async fn test_init_fails_with_invalid_prefix() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some("9lives")).await;
        assert!(result.is_err());
        assert!(!temp_dir.path().join(PESTICIDE_DIR_NAME).exists());
    }

    #[tokio::test]
    async fn test_init_gitignore_hides_secret() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), None).await.unwrap();

        let content = tokio::fs::read_to_string(&result.gitignore_file)
            .await
            .unwrap();
        assert!(content.contains("config.yaml"));
    }

    #[test]
    fn test_secrets_differ_between_calls() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[tokio::test]
    async fn test_two_inits_get_different_secrets() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let a = init(first.path(), None).await.unwrap();
        let b = init(second.path(), None).await.unwrap();

        let a = PesticideConfig::load(&a.config_file).await.unwrap();
        let b = PesticideConfig::load(&b.config_file).await.unwrap();
        assert_ne!(a.auth.jwt_secret, b.auth.jwt_secret);
    }
}
