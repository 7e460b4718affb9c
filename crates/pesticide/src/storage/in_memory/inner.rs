//! Core in-memory storage data structures.

use crate::domain::{Category, Issue, IssueId, Project, User, tag_sequence};
use crate::error::{Error, Result, StorageError};
use crate::id_generation::{IdGenerator, IdKind};
use crate::storage::Snapshot;
use std::collections::HashMap;

/// Inner storage structure (not thread-safe).
///
/// Every id in `issue_index` points at the issue with that id in `issues`,
/// and every stored id is registered with `id_generator`.
#[derive(Debug, Default)]
pub(crate) struct InMemoryStorageInner {
    /// Issues in creation order
    pub(super) issues: Vec<Issue>,

    /// Position of each issue in `issues`
    pub(super) issue_index: HashMap<IssueId, usize>,

    pub(super) categories: Vec<Category>,
    pub(super) projects: Vec<Project>,
    pub(super) users: Vec<User>,

    /// ID generator for every record kind
    pub(super) id_generator: IdGenerator,
}

impl InMemoryStorageInner {
    /// Create a new empty storage instance
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Generate a new unique ID of `kind`
    pub(super) fn generate_id(&mut self, kind: IdKind, seed: &str) -> Result<String> {
        self.id_generator
            .generate(kind, seed)
            .map_err(|e| Error::Storage(StorageError::IdGeneration(e)))
    }

    pub(super) fn issue(&self, id: &IssueId) -> Option<&Issue> {
        self.issue_index.get(id).and_then(|&pos| self.issues.get(pos))
    }

    /// Larger of the issue count and one past the highest `prefix` sequence.
    pub(super) fn next_issue_sequence(&self, prefix: &str) -> usize {
        self.issues
            .iter()
            .filter_map(|i| tag_sequence(&i.tag, prefix))
            .map(|n| n.saturating_add(1))
            .fold(self.issues.len(), usize::max)
    }

    pub(super) fn issue_mut(&mut self, id: &IssueId) -> Result<&mut Issue> {
        let pos = *self
            .issue_index
            .get(id)
            .ok_or_else(|| Error::IssueNotFound(id.to_string()))?;
        self.issues
            .get_mut(pos)
            .ok_or_else(|| Error::Storage(StorageError::MissingRecord(id.to_string())))
    }

    pub(super) fn insert_issue(&mut self, issue: Issue) {
        self.id_generator.register_id(issue.id.as_str());
        for comment in &issue.comments {
            self.id_generator.register_id(comment.id.as_str());
        }
        self.issue_index.insert(issue.id.clone(), self.issues.len());
        self.issues.push(issue);
    }

    pub(super) fn insert_category(&mut self, category: Category) {
        self.id_generator.register_id(category.id.as_str());
        self.categories.push(category);
    }

    pub(super) fn insert_project(&mut self, project: Project) {
        self.id_generator.register_id(project.id.as_str());
        self.projects.push(project);
    }

    pub(super) fn insert_user(&mut self, user: User) {
        self.id_generator.register_id(user.id.as_str());
        self.users.push(user);
    }

    pub(super) fn snapshot(&self) -> Snapshot {
        Snapshot {
            issues: self.issues.clone(),
            categories: self.categories.clone(),
            projects: self.projects.clone(),
            users: self.users.clone(),
        }
    }
}
