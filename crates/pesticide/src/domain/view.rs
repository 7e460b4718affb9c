//! Populated read models.
//!
//! Stored issues reference categories, projects and comment authors by id.
//! Views replace those ids with small `{id, name}` / `{id, username}` objects;
//! a reference whose target no longer resolves becomes `null`.

use super::{Category, CategoryId, CommentId, Issue, IssueId, Project, ProjectId, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resolved category or project reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef<Id> {
    /// Referenced id
    pub id: Id,
    /// Referenced name
    pub name: String,
}

/// A resolved comment author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    /// Author id
    pub id: UserId,
    /// Author login name
    pub username: String,
}

/// A comment with its author populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    /// Comment id
    pub id: CommentId,
    /// Comment text
    pub value: String,
    /// Author, `null` when the user record is gone
    pub author: Option<AuthorRef>,
    /// Posted at
    pub date: DateTime<Utc>,
}

/// An issue with references populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueView {
    /// Issue id
    pub id: IssueId,
    /// Human-readable tag
    pub tag: String,
    /// Title
    pub name: String,
    /// Description
    pub description: String,
    /// Steps to reproduce
    pub reproduction: Option<String>,
    /// Stack trace
    pub stack_trace: Option<String>,
    /// Populated category
    pub category: Option<NamedRef<CategoryId>>,
    /// Populated project
    pub project: Option<NamedRef<ProjectId>>,
    /// Privacy flag
    pub is_private: bool,
    /// Resolution flag
    pub is_resolved: bool,
    /// Resolution notes
    pub dev_notes: Option<String>,
    /// Comments, newest first
    pub comments: Vec<CommentView>,
    /// Created at
    pub date: DateTime<Utc>,
    /// Last updated at
    pub date_updated: DateTime<Utc>,
}

/// Name lookup tables used to populate issue references.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    categories: HashMap<CategoryId, String>,
    projects: HashMap<ProjectId, String>,
    users: HashMap<UserId, String>,
}

impl ReferenceIndex {
    /// Builds the index from full reference collections.
    #[must_use]
    pub fn new(categories: &[Category], projects: &[Project], users: &[User]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|c| (c.id.clone(), c.name.clone()))
                .collect(),
            projects: projects
                .iter()
                .map(|p| (p.id.clone(), p.name.clone()))
                .collect(),
            users: users
                .iter()
                .map(|u| (u.id.clone(), u.username.clone()))
                .collect(),
        }
    }

    /// Replaces reference ids in `issue` with their names.
    #[must_use]
    pub fn populate(&self, issue: Issue) -> IssueView {
        let category = issue.category.and_then(|id| {
            let name = self.categories.get(&id)?.clone();
            Some(NamedRef { id, name })
        });
        let project = issue.project.and_then(|id| {
            let name = self.projects.get(&id)?.clone();
            Some(NamedRef { id, name })
        });
        let comments = issue
            .comments
            .into_iter()
            .map(|c| CommentView {
                author: self.users.get(&c.author).map(|username| AuthorRef {
                    id: c.author.clone(),
                    username: username.clone(),
                }),
                id: c.id,
                value: c.value,
                date: c.date,
            })
            .collect();

        IssueView {
            id: issue.id,
            tag: issue.tag,
            name: issue.name,
            description: issue.description,
            reproduction: issue.reproduction,
            stack_trace: issue.stack_trace,
            category,
            project,
            is_private: issue.is_private,
            is_resolved: issue.is_resolved,
            dev_notes: issue.dev_notes,
            comments,
            date: issue.date,
            date_updated: issue.date_updated,
        }
    }
}
