//! Storage abstraction layer for pesticide.
//!
//! This module provides the core storage trait and factory for creating
//! storage backends:
//!
//! - **In-memory**: ephemeral, every collection behind one mutex
//! - **JSONL**: the in-memory backend plus one `.jsonl` file per collection
//!   in a data directory, rewritten atomically on every `save()`
//!
//! The trait is object-safe and used as `Box<dyn IssueStorage>`.
//!
//! # Example
//!
//! ```no_run
//! use pesticide::domain::NewIssue;
//! use pesticide::storage::{create_storage, StorageBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut storage = create_storage(StorageBackend::InMemory).await?;
//!
//!     let issue = storage
//!         .create_issue(NewIssue {
//!             tag: "PST-0".to_string(),
//!             name: "Crash on save".to_string(),
//!             description: "Saving twice crashes the editor".to_string(),
//!             reproduction: None,
//!             stack_trace: None,
//!             category: None,
//!             project: None,
//!             is_private: false,
//!         })
//!         .await?;
//!     println!("Created issue: {}", issue.tag);
//!     Ok(())
//! }
//! ```

use crate::domain::{Category, Issue, IssueId, NewIssue, NewUser, Project, User, UserId};
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub mod in_memory;

/// Core storage trait.
///
/// Implementations must be `Send + Sync`; the in-memory backend guards its
/// collections with a mutex. Methods that read-modify-write one record
/// (`add_comment`, `resolve_issue`, `create_category`, ...) do so under a
/// single acquisition of that lock.
#[async_trait]
pub trait IssueStorage: Send + Sync {
    // ========== Issues ==========

    /// Sequence number for the next tag under `prefix`.
    ///
    /// Never lower than the number of stored issues, and always above the
    /// highest sequence already used with `prefix`, so records skipped at
    /// load time cannot cause a tag to be handed out twice.
    async fn next_issue_sequence(&self, prefix: &str) -> Result<usize>;

    /// Stores a new issue, assigning its id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns a conflict when another issue already carries the tag.
    async fn create_issue(&mut self, issue: NewIssue) -> Result<Issue>;

    /// Case-insensitive exact tag lookup.
    async fn find_issue_by_tag(&self, tag: &str) -> Result<Option<Issue>>;

    /// Every issue, most recently created first.
    async fn list_issues(&self) -> Result<Vec<Issue>>;

    /// Issues whose tag equals `query` or whose name contains it ignoring
    /// case, in creation order.
    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>>;

    /// Prepends a comment by `author`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` for an unknown id and a conflict when
    /// the issue is resolved.
    async fn add_comment(&mut self, id: &IssueId, author: &UserId, value: String)
    -> Result<Issue>;

    /// Marks the issue resolved with `dev_notes`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` for an unknown id.
    async fn resolve_issue(&mut self, id: &IssueId, dev_notes: Option<String>) -> Result<Issue>;

    // ========== Categories ==========

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the name is already used, ignoring case.
    async fn create_category(&mut self, name: &str) -> Result<Category>;

    /// All categories in creation order.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    // ========== Projects ==========

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the name is already used, ignoring case.
    async fn create_project(&mut self, name: &str) -> Result<Project>;

    /// All projects in creation order.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    // ========== Users ==========

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the username is taken, ignoring case.
    async fn create_user(&mut self, user: NewUser) -> Result<User>;

    /// Get a user by ID.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Case-insensitive username lookup.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All users in creation order.
    async fn list_users(&self) -> Result<Vec<User>>;

    // ========== Batch Operations ==========

    /// Copies every collection, in creation order.
    async fn export_all(&self) -> Result<Snapshot>;

    // ========== Persistence ==========

    /// Save changes to persistent storage.
    ///
    /// Takes `&self`; backends use interior mutability. A no-op for the
    /// in-memory backend.
    async fn save(&self) -> Result<()>;

    /// Reload state from persistent storage, discarding in-memory changes.
    ///
    /// Called after a failed `save()` so memory matches disk again. A no-op
    /// for the in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the data files cannot be read.
    async fn reload(&mut self) -> Result<()>;
}

/// Every stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Issues in creation order
    pub issues: Vec<Issue>,
    /// Categories in creation order
    pub categories: Vec<Category>,
    /// Projects in creation order
    pub projects: Vec<Project>,
    /// Users in creation order
    pub users: Vec<User>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL files in the given data directory (persistent)
    Jsonl(PathBuf),
}

/// Wrapper that adds JSONL persistence to the in-memory backend.
struct JsonlBackedStorage {
    inner: Box<dyn IssueStorage>,
    data_dir: PathBuf,
}

#[async_trait]
impl IssueStorage for JsonlBackedStorage {
    async fn next_issue_sequence(&self, prefix: &str) -> Result<usize> {
        self.inner.next_issue_sequence(prefix).await
    }

    async fn create_issue(&mut self, issue: NewIssue) -> Result<Issue> {
        self.inner.create_issue(issue).await
    }

    async fn find_issue_by_tag(&self, tag: &str) -> Result<Option<Issue>> {
        self.inner.find_issue_by_tag(tag).await
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        self.inner.list_issues().await
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>> {
        self.inner.search_issues(query).await
    }

    async fn add_comment(
        &mut self,
        id: &IssueId,
        author: &UserId,
        value: String,
    ) -> Result<Issue> {
        self.inner.add_comment(id, author, value).await
    }

    async fn resolve_issue(&mut self, id: &IssueId, dev_notes: Option<String>) -> Result<Issue> {
        self.inner.resolve_issue(id, dev_notes).await
    }

    async fn create_category(&mut self, name: &str) -> Result<Category> {
        self.inner.create_category(name).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.inner.list_categories().await
    }

    async fn create_project(&mut self, name: &str) -> Result<Project> {
        self.inner.create_project(name).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.inner.list_projects().await
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.inner.list_users().await
    }

    async fn export_all(&self) -> Result<Snapshot> {
        self.inner.export_all().await
    }

    async fn save(&self) -> Result<()> {
        in_memory::save_to_jsonl(self.inner.as_ref(), &self.data_dir).await
    }

    async fn reload(&mut self) -> Result<()> {
        let (storage, warnings) = in_memory::load_from_jsonl(&self.data_dir).await?;
        for warning in &warnings {
            tracing::warn!(warning = ?warning, "JSONL reload warning");
        }
        self.inner = storage;
        Ok(())
    }
}

/// Create a storage instance for the given backend.
///
/// For [`StorageBackend::Jsonl`] existing data files are loaded; missing
/// files are treated as empty collections (first run).
///
/// # Errors
///
/// Returns an error if existing data files cannot be read.
pub async fn create_storage(backend: StorageBackend) -> Result<Box<dyn IssueStorage>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_storage()),
        StorageBackend::Jsonl(data_dir) => {
            let (inner, warnings) = in_memory::load_from_jsonl(&data_dir).await?;
            for warning in &warnings {
                tracing::warn!(warning = ?warning, "JSONL load warning");
            }
            tracing::debug!(data_dir = %data_dir.display(), "Opened JSONL storage");
            Ok(Box::new(JsonlBackedStorage { inner, data_dir }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_issue(tag: &str, name: &str) -> NewIssue {
        NewIssue {
            tag: tag.to_string(),
            name: name.to_string(),
            description: "description".to_string(),
            reproduction: None,
            stack_trace: None,
            category: None,
            project: None,
            is_private: false,
        }
    }

    async fn issue_count(storage: &dyn IssueStorage) -> usize {
        storage.list_issues().await.unwrap().len()
    }

    #[tokio::test]
    async fn test_next_sequence_skips_past_highest_tag() {
        let mut storage = create_storage(StorageBackend::InMemory).await.unwrap();
        assert_eq!(storage.next_issue_sequence("PST-").await.unwrap(), 0);

        storage
            .create_issue(new_issue("PST-7", "Imported"))
            .await
            .unwrap();
        storage
            .create_issue(new_issue("OLD-40", "Other prefix"))
            .await
            .unwrap();

        assert_eq!(storage.next_issue_sequence("PST-").await.unwrap(), 8);
        assert_eq!(storage.next_issue_sequence("pst-").await.unwrap(), 8);
        assert_eq!(storage.next_issue_sequence("NEW-").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_issue_rejects_taken_tag() {
        let mut storage = create_storage(StorageBackend::InMemory).await.unwrap();
        storage
            .create_issue(new_issue("PST-0", "First"))
            .await
            .unwrap();

        let err = storage
            .create_issue(new_issue("pst-0", "Second"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Conflict { field: "tag", .. }));
        assert_eq!(issue_count(storage.as_ref()).await, 1);
    }

    #[tokio::test]
    async fn test_jsonl_reload_restores_disk_state() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        let mut storage = create_storage(StorageBackend::Jsonl(data_dir.clone()))
            .await
            .unwrap();

        let created = storage
            .create_issue(new_issue("PST-0", "Saved"))
            .await
            .unwrap();
        storage.save().await.unwrap();

        storage.resolve_issue(&created.id, None).await.unwrap();
        storage
            .create_issue(new_issue("PST-1", "Unsaved"))
            .await
            .unwrap();
        assert_eq!(issue_count(storage.as_ref()).await, 2);

        storage.reload().await.unwrap();

        assert_eq!(issue_count(storage.as_ref()).await, 1);
        let after = storage.find_issue_by_tag("PST-0").await.unwrap().unwrap();
        assert_eq!(after.id, created.id);
        assert!(!after.is_resolved);
    }

    #[tokio::test]
    async fn test_jsonl_reload_with_files_removed() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        let mut storage = create_storage(StorageBackend::Jsonl(data_dir.clone()))
            .await
            .unwrap();
        storage.create_category("UI").await.unwrap();
        storage.save().await.unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();
        storage.reload().await.unwrap();

        assert!(storage.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_reload_is_noop() {
        let mut storage = create_storage(StorageBackend::InMemory).await.unwrap();
        storage
            .create_issue(new_issue("PST-0", "Kept"))
            .await
            .unwrap();

        storage.save().await.unwrap();
        storage.reload().await.unwrap();

        assert_eq!(issue_count(storage.as_ref()).await, 1);
    }
}
