//! Shared request state and caller identity.
//!
//! [`AppState`] is cloned into every handler. [`Identity`] reads the
//! `Authorization` header and yields the user id named by a valid bearer
//! token; handlers pass it straight to the service, which decides whether an
//! anonymous caller is acceptable. Public routes use [`OptionalIdentity`],
//! which treats a bad token like no token.

use crate::error::Error;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use pesticide::app::App;
use pesticide::auth::TokenAuthority;
use pesticide::domain::UserId;
use pesticide::service::IssueService;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lifecycle service over the workspace storage
    pub service: IssueService,
    /// Verifies bearer tokens
    pub tokens: Arc<TokenAuthority>,
}

impl AppState {
    /// Builds state from explicit parts.
    #[must_use]
    pub fn new(service: IssueService, tokens: TokenAuthority) -> Self {
        Self {
            service,
            tokens: Arc::new(tokens),
        }
    }

    /// Builds state from a loaded workspace.
    ///
    /// # Errors
    ///
    /// Returns an error when the workspace has no JWT secret configured.
    pub fn from_app(app: &App) -> crate::Result<Self> {
        Ok(Self::new(app.service().clone(), app.token_authority()?))
    }
}

/// The caller named by the bearer token, if one was sent.
///
/// A missing header yields `Identity(None)`. A header that is present but
/// malformed, expired or signed with another key is rejected with 401.
/// Public routes use [`OptionalIdentity`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub Option<UserId>);

impl Identity {
    /// Borrowed user id for service calls.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };
        let header = value.to_str().map_err(|_| {
            pesticide::error::Error::Authentication("authorization header is not ASCII".to_string())
        })?;
        let user_id = state.tokens.verify_header(header)?;
        Ok(Self(Some(user_id)))
    }
}

/// The caller named by a valid bearer token; anything else is anonymous.
///
/// Clients keep sending their last token after it expires, so public routes
/// must not turn a stale header into a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalIdentity(pub Option<UserId>);

impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Identity::from_request_parts(parts, state).await {
            Ok(Identity(user_id)) => Ok(Self(user_id)),
            Err(e) => {
                debug!(error = %e, "Ignoring invalid credentials on public route");
                Ok(Self(None))
            }
        }
    }
}
