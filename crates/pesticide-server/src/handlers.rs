//! Route handlers.
//!
//! Each handler extracts the caller and payload, delegates to
//! [`IssueService`](pesticide::service::IssueService) and returns the result as
//! JSON. Status codes for failures come from [`Error`](crate::Error).

use crate::context::{AppState, Identity, OptionalIdentity};
use crate::error::{Error, Result};
use crate::models::ViewIssueRequest;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use pesticide::auth::Permissions;
use pesticide::domain::{
    Category, IssueView, NewCategoryInput, NewCommentInput, NewIssueInput, NewProjectInput,
    Project, ResolveInput,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// `GET /issues`
pub async fn list_issues(State(state): State<AppState>) -> Result<Json<Vec<IssueView>>> {
    debug!("GET /issues");
    Ok(Json(state.service.list_public_issues().await?))
}

/// `POST /issues/newIssue`
pub async fn create_issue(
    State(state): State<AppState>,
    identity: Identity,
    payload: std::result::Result<Json<NewIssueInput>, JsonRejection>,
) -> Result<Json<IssueView>> {
    let Json(input) = payload?;
    debug!(user = ?identity.user_id(), "POST /issues/newIssue");
    let issue = state
        .service
        .create_issue(input, identity.user_id())
        .await?;
    Ok(Json(issue))
}

/// `POST /issues/v/{tag}`
///
/// A valid bearer identity wins over an `id` in the body; an invalid one is
/// ignored.
pub async fn view_issue(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    identity: OptionalIdentity,
    body: Bytes,
) -> Result<Json<IssueView>> {
    let request: ViewIssueRequest = optional_json(&body)?;
    let requester = identity.0.or_else(|| request.requester());
    debug!(tag = %tag, requester = ?requester, "POST /issues/v/{{tag}}");
    let issue = state
        .service
        .get_issue_by_tag(&tag, requester.as_ref())
        .await?;
    Ok(Json(issue))
}

/// `POST /issues/v/{tag}/comment`
pub async fn add_comment(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    identity: Identity,
    payload: std::result::Result<Json<NewCommentInput>, JsonRejection>,
) -> Result<Json<IssueView>> {
    let Json(input) = payload?;
    debug!(tag = %tag, user = ?identity.user_id(), "POST /issues/v/{{tag}}/comment");
    let issue = state
        .service
        .add_comment(&tag, identity.user_id(), input)
        .await?;
    Ok(Json(issue))
}

/// `PUT /issues/v/{tag}/close`
///
/// The body is optional; without one the issue is resolved without notes.
pub async fn close_issue(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    identity: Identity,
    body: Bytes,
) -> Result<Json<IssueView>> {
    let input: ResolveInput = optional_json(&body)?;
    debug!(tag = %tag, user = ?identity.user_id(), "PUT /issues/v/{{tag}}/close");
    let issue = state
        .service
        .resolve_issue(&tag, identity.user_id(), input)
        .await?;
    Ok(Json(issue))
}

/// `GET /search/{query}`
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<IssueView>>> {
    debug!(query = %query, "GET /search/{{query}}");
    Ok(Json(state.service.search_issues(&query).await?))
}

/// `POST /issues/newCategory`
pub async fn create_category(
    State(state): State<AppState>,
    identity: Identity,
    payload: std::result::Result<Json<NewCategoryInput>, JsonRejection>,
) -> Result<Json<Category>> {
    let Json(input) = payload?;
    let category = state
        .service
        .create_category(input, identity.user_id())
        .await?;
    Ok(Json(category))
}

/// `POST /issues/newProject`
pub async fn create_project(
    State(state): State<AppState>,
    identity: Identity,
    payload: std::result::Result<Json<NewProjectInput>, JsonRejection>,
) -> Result<Json<Project>> {
    let Json(input) = payload?;
    let project = state
        .service
        .create_project(input, identity.user_id())
        .await?;
    Ok(Json(project))
}

/// `GET /issues/getCategories`
pub async fn list_categories(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.service.list_categories(identity.user_id()).await?))
}

/// `GET /issues/getProjects`
pub async fn list_projects(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.service.list_projects(identity.user_id()).await?))
}

/// `GET /users/permissions`
pub async fn permissions(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Permissions>> {
    Ok(Json(state.service.permissions(identity.user_id()).await?))
}

/// Parses a JSON body that may be omitted entirely.
fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| Error::MalformedBody(e.to_string()))
}
