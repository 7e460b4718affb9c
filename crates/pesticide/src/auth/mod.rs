//! Capability-based authorization.
//!
//! Callers are identified by bearer tokens (see [`token`]); the user record is
//! then looked up so the current `isAdmin` / `isDeveloper` flags decide what
//! the caller may do. Every privilege check goes through [`authorize`].

pub mod token;

pub use token::{Claims, TokenAuthority, parse_bearer};

use crate::domain::{User, UserId};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// User id
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Admin flag at request time
    pub is_admin: bool,
    /// Developer flag at request time
    pub is_developer: bool,
}

impl Principal {
    /// Whether this principal holds `capability`.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        capability.is_granted_to(self)
    }

    /// Role flags as reported to clients.
    #[must_use]
    pub fn permissions(&self) -> Permissions {
        Permissions {
            is_admin: self.is_admin,
            is_developer: self.is_developer,
        }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            is_developer: user.is_developer,
        }
    }
}

/// Actions gated by role flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// File issues and comment on them
    FileIssues,
    /// Close issues with notes
    ResolveIssues,
    /// Create categories and projects
    ManageCatalog,
    /// Read issues marked private
    ViewPrivateIssues,
}

impl Capability {
    /// Role rule for this capability.
    ///
    /// Private issues need both flags while resolution needs either one.
    #[must_use]
    pub fn is_granted_to(self, principal: &Principal) -> bool {
        match self {
            Self::FileIssues => true,
            Self::ResolveIssues => principal.is_admin || principal.is_developer,
            Self::ManageCatalog => principal.is_admin,
            Self::ViewPrivateIssues => principal.is_admin && principal.is_developer,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileIssues => write!(f, "file-issues"),
            Self::ResolveIssues => write!(f, "resolve-issues"),
            Self::ManageCatalog => write!(f, "manage-catalog"),
            Self::ViewPrivateIssues => write!(f, "view-private-issues"),
        }
    }
}

/// Role flags of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    /// Admin flag
    pub is_admin: bool,
    /// Developer flag
    pub is_developer: bool,
}

/// Checks that `principal` holds `capability`.
///
/// # Errors
///
/// Returns [`Error::Authorization`] when the capability is not granted.
pub fn authorize(principal: &Principal, capability: Capability) -> Result<()> {
    if principal.can(capability) {
        Ok(())
    } else {
        debug!(user = %principal.username, %capability, "Capability denied");
        Err(Error::Authorization(capability))
    }
}
