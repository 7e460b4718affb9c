//! Issue lifecycle service.
//!
//! [`IssueService`] is the single entry point for every issue, comment,
//! category and project operation. It owns the storage handle, turns caller
//! identities into [`Principal`]s, runs validation and authorization in a fixed
//! order and persists after each mutation.
//!
//! # Locking
//!
//! Storage sits behind one `Arc<RwLock<Box<dyn IssueStorage>>>`. Queries take
//! the read lock. Mutations take the write lock and hold it across
//! read-modify-write and `save()`, so two concurrent `create_issue` calls can
//! never observe the same issue count and tags stay unique.

use crate::auth::{Capability, Permissions, Principal, authorize};
use crate::domain::{
    Category, IssueView, NewCategoryInput, NewCommentInput, NewIssueInput, NewProjectInput,
    NewUser, Project, ReferenceIndex, ResolveInput, User, UserId, format_tag,
};
use crate::error::{Error, Result};
use crate::storage::IssueStorage;
use crate::validation::{FieldErrors, MAX_USERNAME_LENGTH};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Shared storage handle.
pub type SharedStorage = Arc<RwLock<Box<dyn IssueStorage>>>;

/// Issue lifecycle operations over shared storage.
#[derive(Clone)]
pub struct IssueService {
    storage: SharedStorage,
    prefix: String,
}

impl std::fmt::Debug for IssueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueService")
            .field("prefix", &self.prefix)
            .field("storage", &"<dyn IssueStorage>")
            .finish()
    }
}

impl IssueService {
    /// Wraps `storage`; new issues are tagged `<prefix><count>`.
    pub fn new(storage: Box<dyn IssueStorage>, prefix: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(RwLock::new(storage)),
            prefix: prefix.into(),
        }
    }

    /// Tag prefix in effect.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Shared storage handle.
    #[must_use]
    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    // ========== Issues ==========

    /// Every issue, newest first, with references populated.
    ///
    /// Private issues are included; clients decide what to show.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn list_public_issues(&self) -> Result<Vec<IssueView>> {
        let storage = self.storage.read().await;
        let issues = storage.list_issues().await?;
        let index = reference_index(&**storage).await?;
        Ok(issues.into_iter().map(|i| index.populate(i)).collect())
    }

    /// Files a new issue on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Authentication when `user_id` is missing or unknown, validation when
    /// the input is incomplete.
    pub async fn create_issue(
        &self,
        input: NewIssueInput,
        user_id: Option<&UserId>,
    ) -> Result<IssueView> {
        let mut storage = self.storage.write().await;
        let principal = authenticate(&**storage, user_id).await?;
        authorize(&principal, Capability::FileIssues)?;
        input.validate().into_result()?;

        let sequence = storage.next_issue_sequence(&self.prefix).await?;
        let tag = format_tag(&self.prefix, sequence);
        let issue = storage.create_issue(input.into_new_issue(tag)).await?;
        persist(&mut storage).await?;

        info!(tag = %issue.tag, user = %principal.username, "Issue created");
        let index = reference_index(&**storage).await?;
        Ok(index.populate(issue))
    }

    /// Looks up an issue by tag, ignoring case.
    ///
    /// Private issues are only returned to requesters that are both admin and
    /// developer.
    ///
    /// # Errors
    ///
    /// Not found for an unknown tag, authorization for a private issue and an
    /// insufficiently privileged or anonymous requester.
    pub async fn get_issue_by_tag(
        &self,
        tag: &str,
        requester: Option<&UserId>,
    ) -> Result<IssueView> {
        let storage = self.storage.read().await;
        let issue = storage
            .find_issue_by_tag(tag)
            .await?
            .ok_or_else(|| Error::IssueNotFound(tag.to_string()))?;

        if issue.is_private {
            match lookup_principal(&**storage, requester).await? {
                Some(principal) => authorize(&principal, Capability::ViewPrivateIssues)?,
                None => {
                    debug!(tag, "Anonymous request for private issue");
                    return Err(Error::Authorization(Capability::ViewPrivateIssues));
                }
            }
        }

        let index = reference_index(&**storage).await?;
        Ok(index.populate(issue))
    }

    /// Prepends a comment by `user_id` to the issue tagged `tag`.
    ///
    /// A resolved issue rejects the comment before the input is validated.
    ///
    /// # Errors
    ///
    /// Authentication, not found, conflict for a resolved issue, then validation.
    pub async fn add_comment(
        &self,
        tag: &str,
        user_id: Option<&UserId>,
        input: NewCommentInput,
    ) -> Result<IssueView> {
        let mut storage = self.storage.write().await;
        let principal = authenticate(&**storage, user_id).await?;
        authorize(&principal, Capability::FileIssues)?;

        let issue = storage
            .find_issue_by_tag(tag)
            .await?
            .ok_or_else(|| Error::IssueNotFound(tag.to_string()))?;
        if issue.is_resolved {
            return Err(Error::issue_closed());
        }
        input.validate().into_result()?;

        let issue = storage
            .add_comment(&issue.id, &principal.id, input.comment)
            .await?;
        persist(&mut storage).await?;

        info!(tag = %issue.tag, user = %principal.username, "Comment added");
        let index = reference_index(&**storage).await?;
        Ok(index.populate(issue))
    }

    /// Resolves the issue tagged `tag`. Resolving again replaces the notes.
    ///
    /// # Errors
    ///
    /// Authentication, authorization unless admin or developer, then not found.
    pub async fn resolve_issue(
        &self,
        tag: &str,
        user_id: Option<&UserId>,
        input: ResolveInput,
    ) -> Result<IssueView> {
        let mut storage = self.storage.write().await;
        let principal = authenticate(&**storage, user_id).await?;
        authorize(&principal, Capability::ResolveIssues)?;

        let issue = storage
            .find_issue_by_tag(tag)
            .await?
            .ok_or_else(|| Error::IssueNotFound(tag.to_string()))?;
        input.validate().into_result()?;

        let issue = storage.resolve_issue(&issue.id, input.into_notes()).await?;
        persist(&mut storage).await?;

        info!(tag = %issue.tag, user = %principal.username, "Issue resolved");
        let index = reference_index(&**storage).await?;
        Ok(index.populate(issue))
    }

    /// Issues whose tag equals `query` or whose name contains it, ignoring
    /// case; creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn search_issues(&self, query: &str) -> Result<Vec<IssueView>> {
        let storage = self.storage.read().await;
        let issues = storage.search_issues(query).await?;
        debug!(query, hits = issues.len(), "Search");
        let index = reference_index(&**storage).await?;
        Ok(issues.into_iter().map(|i| index.populate(i)).collect())
    }

    // ========== Catalog ==========

    /// Creates a category. Admin only.
    ///
    /// # Errors
    ///
    /// Authentication, authorization, validation, then conflict on a duplicate name.
    pub async fn create_category(
        &self,
        input: NewCategoryInput,
        user_id: Option<&UserId>,
    ) -> Result<Category> {
        let mut storage = self.storage.write().await;
        let principal = authenticate(&**storage, user_id).await?;
        authorize(&principal, Capability::ManageCatalog)?;
        input.validate().into_result()?;

        let category = storage.create_category(&input.category_name).await?;
        persist(&mut storage).await?;

        info!(category = %category.name, user = %principal.username, "Category created");
        Ok(category)
    }

    /// Creates a project. Admin only.
    ///
    /// # Errors
    ///
    /// Authentication, authorization, validation, then conflict on a duplicate name.
    pub async fn create_project(
        &self,
        input: NewProjectInput,
        user_id: Option<&UserId>,
    ) -> Result<Project> {
        let mut storage = self.storage.write().await;
        let principal = authenticate(&**storage, user_id).await?;
        authorize(&principal, Capability::ManageCatalog)?;
        input.validate().into_result()?;

        let project = storage.create_project(&input.name).await?;
        persist(&mut storage).await?;

        info!(project = %project.name, user = %principal.username, "Project created");
        Ok(project)
    }

    /// All categories. Requires authentication.
    ///
    /// # Errors
    ///
    /// Authentication when `user_id` is missing or unknown.
    pub async fn list_categories(&self, user_id: Option<&UserId>) -> Result<Vec<Category>> {
        let storage = self.storage.read().await;
        authenticate(&**storage, user_id).await?;
        storage.list_categories().await
    }

    /// All projects. Requires authentication.
    ///
    /// # Errors
    ///
    /// Authentication when `user_id` is missing or unknown.
    pub async fn list_projects(&self, user_id: Option<&UserId>) -> Result<Vec<Project>> {
        let storage = self.storage.read().await;
        authenticate(&**storage, user_id).await?;
        storage.list_projects().await
    }

    // ========== Users ==========

    /// Role flags of the caller.
    ///
    /// # Errors
    ///
    /// Authentication when `user_id` is missing or unknown.
    pub async fn permissions(&self, user_id: Option<&UserId>) -> Result<Permissions> {
        let storage = self.storage.read().await;
        Ok(authenticate(&**storage, user_id).await?.permissions())
    }

    /// Resolves `user_id` into a principal.
    ///
    /// # Errors
    ///
    /// Authentication when `user_id` is missing or unknown.
    pub async fn authenticate(&self, user_id: Option<&UserId>) -> Result<Principal> {
        let storage = self.storage.read().await;
        authenticate(&**storage, user_id).await
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Validation for a malformed username, conflict when it is taken.
    pub async fn register_user(&self, new_user: NewUser) -> Result<User> {
        validate_username(&new_user.username)?;

        let mut storage = self.storage.write().await;
        let user = storage.create_user(new_user).await?;
        persist(&mut storage).await?;

        info!(
            user = %user.username,
            is_admin = user.is_admin,
            is_developer = user.is_developer,
            "User registered"
        );
        Ok(user)
    }

    /// Looks up a user by name, ignoring case.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`] when no such user exists.
    pub async fn find_user(&self, username: &str) -> Result<User> {
        let storage = self.storage.read().await;
        storage
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    /// All users in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.storage.read().await.list_users().await
    }
}

async fn authenticate(storage: &dyn IssueStorage, user_id: Option<&UserId>) -> Result<Principal> {
    let Some(user_id) = user_id else {
        return Err(Error::Authentication("missing credentials".to_string()));
    };
    lookup_principal(storage, Some(user_id))
        .await?
        .ok_or_else(|| Error::Authentication(format!("unknown user {user_id}")))
}

async fn lookup_principal(
    storage: &dyn IssueStorage,
    user_id: Option<&UserId>,
) -> Result<Option<Principal>> {
    match user_id {
        Some(id) => Ok(storage.get_user(id).await?.as_ref().map(Principal::from)),
        None => Ok(None),
    }
}

async fn reference_index(storage: &dyn IssueStorage) -> Result<ReferenceIndex> {
    Ok(ReferenceIndex::new(
        &storage.list_categories().await?,
        &storage.list_projects().await?,
        &storage.list_users().await?,
    ))
}

/// Saves, and on failure reloads so memory matches disk again.
async fn persist(storage: &mut Box<dyn IssueStorage>) -> Result<()> {
    if let Err(e) = storage.save().await {
        error!(error = %e, "Failed to save storage, reloading from disk");
        if let Err(reload_err) = storage.reload().await {
            error!(error = %reload_err, "Failed to reload storage after save failure");
        }
        return Err(e);
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<()> {
    let mut errors = FieldErrors::new();
    errors.require("username", "Username", username);
    errors.max_length("username", "Username", username.trim(), MAX_USERNAME_LENGTH);
    if username
        .trim()
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        errors.insert("username", "Username must not contain whitespace");
    }
    errors.into_result()
}
