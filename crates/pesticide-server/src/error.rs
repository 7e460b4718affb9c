//! Error types for the pesticide HTTP server.
//!
//! [`Error`] implements [`IntoResponse`], so handlers return
//! `Result<Json<T>>` and let `?` pick the status code and body.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pesticide::error::ErrorKind;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Body returned for any authentication or authorization failure.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Body returned for internal failures; details go to the log only.
pub const INTERNAL_MESSAGE: &str = "An error has occurred";

/// Body returned when no issue has the requested tag.
pub const ISSUE_NOT_FOUND_MESSAGE: &str = "Issue not found!";

/// Errors that can occur in the pesticide HTTP server.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the pesticide core.
    #[error(transparent)]
    Core(#[from] pesticide::error::Error),

    /// The request body was not valid JSON for the route.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// The listener could not be bound or the server failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pesticide server operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Error category, which decides the HTTP status.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::MalformedBody(_) => ErrorKind::Validation,
            Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication | ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        use pesticide::error::Error as Core;

        match self {
            Self::Core(Core::Validation(fields)) => serde_json::to_value(fields).unwrap_or_default(),
            Self::Core(Core::Conflict { field, message }) => {
                let mut body = Map::new();
                body.insert((*field).to_string(), Value::String(message.clone()));
                Value::Object(body)
            }
            Self::Core(Core::UserNotFound(_)) => json!({ "user": "User not found!" }),
            Self::MalformedBody(message) => json!({ "body": message }),
            _ => match self.kind() {
                ErrorKind::NotFound => json!({ "issue": ISSUE_NOT_FOUND_MESSAGE }),
                ErrorKind::Authentication | ErrorKind::Authorization => {
                    json!({ "error": UNAUTHORIZED_MESSAGE })
                }
                _ => json!({ "error": INTERNAL_MESSAGE }),
            },
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.kind() {
            ErrorKind::Internal => tracing::error!(error = %self, "Request failed"),
            ErrorKind::Authentication | ErrorKind::Authorization => {
                tracing::warn!(error = %self, "Request rejected");
            }
            _ => tracing::debug!(error = %self, status = %status, "Request refused"),
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pesticide::auth::Capability;
    use pesticide::error::Error as Core;
    use pesticide::validation::FieldErrors;
    use rstest::rstest;

    #[rstest]
    #[case::validation(Core::Validation(FieldErrors::single("name", "Name field is required")), StatusCode::BAD_REQUEST)]
    #[case::conflict(Core::Conflict { field: "issue", message: "This issue is closed!".to_string() }, StatusCode::BAD_REQUEST)]
    #[case::authentication(Core::Authentication("missing credentials".to_string()), StatusCode::UNAUTHORIZED)]
    #[case::authorization(Core::Authorization(Capability::ResolveIssues), StatusCode::UNAUTHORIZED)]
    #[case::not_found(Core::IssueNotFound("PST-9".to_string()), StatusCode::NOT_FOUND)]
    #[case::internal(Core::Io(std::io::Error::other("disk gone")), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] error: Core, #[case] expected: StatusCode) {
        assert_eq!(Error::from(error).status(), expected);
    }

    #[test]
    fn test_conflict_body_uses_field() {
        let error = Error::from(Core::Conflict {
            field: "title",
            message: "A project with this title already exists!".to_string(),
        });
        assert_eq!(
            error.body(),
            json!({ "title": "A project with this title already exists!" })
        );
    }

    #[test]
    fn test_internal_body_hides_details() {
        let error = Error::from(Core::Io(std::io::Error::other("secret path /var/x")));
        assert_eq!(error.body(), json!({ "error": "An error has occurred" }));
    }

    #[test]
    fn test_malformed_body_is_validation() {
        let error = Error::MalformedBody("expected value".to_string());
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.body(), json!({ "body": "expected value" }));
    }
}
