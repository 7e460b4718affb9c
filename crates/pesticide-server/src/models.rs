//! Request bodies specific to the HTTP surface.
//!
//! Lifecycle payloads come from [`pesticide::domain::input`]; this module only
//! holds what the transport adds on top.

use pesticide::domain::UserId;
use serde::Deserialize;

/// Body of `POST /issues/v/{tag}`.
///
/// Names the requester when no bearer token is sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewIssueRequest {
    /// Requesting user id
    pub id: Option<UserId>,
}

impl ViewIssueRequest {
    /// Requester id with a blank value treated as absent.
    #[must_use]
    pub fn requester(self) -> Option<UserId> {
        self.id.filter(|id| !id.is_blank())
    }
}
