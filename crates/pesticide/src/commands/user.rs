//! User administration: registering principals and minting their tokens.

use crate::app::App;
use crate::domain::{NewUser, User};
use crate::error::Result;

/// Registers `username` with the given role flags.
///
/// # Errors
///
/// Validation for a malformed name, conflict when the name is taken.
pub async fn add_user(app: &App, username: &str, is_admin: bool, is_developer: bool) -> Result<User> {
    app.service()
        .register_user(NewUser {
            username: username.trim().to_string(),
            is_admin,
            is_developer,
        })
        .await
}

/// Mints a bearer token for `username`.
///
/// # Errors
///
/// [`crate::error::Error::UserNotFound`] for an unknown user, or a
/// configuration error when no secret is set.
pub async fn mint_token(app: &App, username: &str) -> Result<(User, String)> {
    let user = app.service().find_user(username).await?;
    let token = app.token_authority()?.issue(&user)?;
    tracing::debug!(user = %user.username, "Minted token");
    Ok((user, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::init;
    use crate::error::{Error, ErrorKind};
    use tempfile::TempDir;

    async fn app() -> (TempDir, App) {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();
        let app = App::from_directory(temp_dir.path()).await.unwrap();
        (temp_dir, app)
    }

    #[tokio::test]
    async fn test_add_user_rejects_duplicates_ignoring_case() {
        let (_dir, app) = app().await;
        add_user(&app, "alice", false, true).await.unwrap();

        let err = add_user(&app, "Alice", true, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_add_user_rejects_blank_name() {
        let (_dir, app) = app().await;
        let err = add_user(&app, "   ", false, false).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref e) if e.get("username").is_some()));
    }

    #[tokio::test]
    async fn test_minted_token_names_user() {
        let (_dir, app) = app().await;
        let user = add_user(&app, "bob", false, false).await.unwrap();

        let (found, token) = mint_token(&app, "BOB").await.unwrap();
        assert_eq!(found.id, user.id);

        let claims = app.token_authority().unwrap().verify(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn test_mint_token_for_unknown_user() {
        let (_dir, app) = app().await;
        let err = mint_token(&app, "ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
