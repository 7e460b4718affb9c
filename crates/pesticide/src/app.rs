//! Application context for CLI commands and the HTTP server.
//!
//! # Example
//!
//! ```no_run
//! use pesticide::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let issues = app.service().list_public_issues().await?;
//!     println!("{} issues", issues.len());
//!     Ok(())
//! }
//! ```

use crate::auth::TokenAuthority;
use crate::config::{CONFIG_FILE_NAME, PESTICIDE_DIR_NAME, PesticideConfig, find_workspace_root};
use crate::error::{ConfigError, Result};
use crate::service::IssueService;
use crate::storage::create_storage;
use std::path::{Path, PathBuf};

/// A loaded workspace: configuration plus a ready lifecycle service.
#[derive(Debug)]
pub struct App {
    service: IssueService,
    config: PesticideConfig,
    root_dir: PathBuf,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.pesticide/`, loads the
    /// configuration and opens storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no workspace is found in the directory tree
    /// - the configuration cannot be loaded
    /// - storage initialization fails
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_workspace_root(working_dir).ok_or(ConfigError::NotInitialized)?;
        let config_path = root_dir.join(PESTICIDE_DIR_NAME).join(CONFIG_FILE_NAME);

        let config = PesticideConfig::load(&config_path).await?;
        let backend = config.storage.to_backend(&root_dir)?;
        let storage = create_storage(backend).await?;

        tracing::debug!(root = %root_dir.display(), prefix = %config.issue_prefix, "Loaded workspace");

        Ok(Self {
            service: IssueService::new(storage, config.issue_prefix.clone()),
            config,
            root_dir,
        })
    }

    /// The lifecycle service.
    #[must_use]
    pub fn service(&self) -> &IssueService {
        &self.service
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &PesticideConfig {
        &self.config
    }

    /// Directory containing `.pesticide/`.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Token authority built from the `auth` section.
    ///
    /// # Errors
    ///
    /// Returns an error when no secret is configured.
    pub fn token_authority(&self) -> Result<TokenAuthority> {
        TokenAuthority::from_config(&self.config.auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_app_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("APP-")).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert_eq!(app.service().prefix(), "APP-");
        assert_eq!(app.root_dir(), temp_dir.path());
        assert!(app.token_authority().is_ok());
    }

    #[tokio::test]
    async fn test_app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None).await.unwrap();

        let sub_dir = temp_dir.path().join("src").join("lib");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let app = App::from_directory(&sub_dir).await.unwrap();
        assert_eq!(app.config().issue_prefix, "PST-");
    }

    #[tokio::test]
    async fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Not a pesticide workspace"));
    }

    #[tokio::test]
    async fn test_app_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None).await.unwrap();

        {
            let app = App::from_directory(temp_dir.path()).await.unwrap();
            app.service()
                .register_user(crate::domain::NewUser {
                    username: "alice".to_string(),
                    is_admin: true,
                    is_developer: false,
                })
                .await
                .unwrap();
        }

        let app = App::from_directory(temp_dir.path()).await.unwrap();
        let alice = app.service().find_user("ALICE").await.unwrap();
        assert!(alice.is_admin);
    }
}
