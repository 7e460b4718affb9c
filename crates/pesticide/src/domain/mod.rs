//! Domain types for issue tracking.
//!
//! An [`Issue`] is filed once, collects comments while it is open and is
//! resolved exactly once; it is never deleted or reopened. Categories,
//! projects and users are reference data created once and never changed.

mod ids;
pub mod input;
pub mod view;

pub use ids::{CategoryId, CommentId, IssueId, ProjectId, UserId};
pub use input::{NewCategoryInput, NewCommentInput, NewIssueInput, NewProjectInput, ResolveInput};
pub use view::{AuthorRef, CommentView, IssueView, NamedRef, ReferenceIndex};

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an issue in the tracking system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier for the issue
    pub id: IssueId,

    /// Human-readable identifier, `<prefix><sequence>`
    pub tag: String,

    /// Issue title
    pub name: String,

    /// Issue description
    pub description: String,

    /// Steps to reproduce (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reproduction: Option<String>,

    /// Captured stack trace (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    /// Category the issue is filed under
    #[serde(default)]
    pub category: Option<CategoryId>,

    /// Project the issue is filed against
    #[serde(default)]
    pub project: Option<ProjectId>,

    /// Hidden from everyone but admin developers
    #[serde(default)]
    pub is_private: bool,

    /// Set once by resolution, never cleared
    #[serde(default)]
    pub is_resolved: bool,

    /// Resolution notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_notes: Option<String>,

    /// Comments, newest first
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Creation timestamp
    pub date: DateTime<Utc>,

    /// Last update timestamp
    pub date_updated: DateTime<Utc>,
}

impl Issue {
    /// Case-insensitive tag comparison.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Search predicate: exact tag match or case-insensitive substring of the name.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        self.tag == query || self.name.to_lowercase().contains(&query.to_lowercase())
    }

    /// Prepends `comment`.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the issue is already resolved.
    pub fn push_comment(&mut self, comment: Comment) -> Result<()> {
        if self.is_resolved {
            return Err(Error::issue_closed());
        }
        self.comments.insert(0, comment);
        Ok(())
    }

    /// Marks the issue resolved. Resolving again replaces the notes.
    pub fn resolve(&mut self, dev_notes: Option<String>, now: DateTime<Utc>) {
        self.is_resolved = true;
        self.dev_notes = dev_notes;
        self.date_updated = now;
    }

    /// Structural checks applied to records loaded from disk.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        if self.id.is_blank() {
            return Err("issue id is empty".to_string());
        }
        if self.tag.trim().is_empty() {
            return Err(format!("issue {} has an empty tag", self.id));
        }
        if self.name.trim().is_empty() {
            return Err(format!("issue {} has an empty name", self.id));
        }
        if !self.is_resolved && self.dev_notes.is_some() {
            return Err(format!("open issue {} carries dev notes", self.id));
        }
        Ok(())
    }
}

/// A comment on an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique identifier
    pub id: CommentId,
    /// Comment text
    pub value: String,
    /// Authoring user
    pub author: UserId,
    /// When the comment was posted
    pub date: DateTime<Utc>,
}

/// An issue category (e.g. "UI", "Performance")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,
    /// Display name, unique ignoring case
    pub name: String,
    /// Creation timestamp
    pub date: DateTime<Utc>,
}

/// A project issues are filed against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: ProjectId,
    /// Display name, unique ignoring case
    pub name: String,
    /// Creation timestamp
    pub date: DateTime<Utc>,
}

/// A principal that can file, comment on and resolve issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Login name, unique ignoring case
    pub username: String,
    /// May manage categories and projects
    #[serde(default)]
    pub is_admin: bool,
    /// May resolve issues
    #[serde(default)]
    pub is_developer: bool,
    /// Creation timestamp
    pub date: DateTime<Utc>,
}

/// A validated issue ready for storage; the backend assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    /// Precomputed tag
    pub tag: String,
    /// Issue title
    pub name: String,
    /// Issue description
    pub description: String,
    /// Steps to reproduce
    pub reproduction: Option<String>,
    /// Captured stack trace
    pub stack_trace: Option<String>,
    /// Category reference
    pub category: Option<CategoryId>,
    /// Project reference
    pub project: Option<ProjectId>,
    /// Privacy flag
    pub is_private: bool,
}

/// A user to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login name
    pub username: String,
    /// Admin flag
    pub is_admin: bool,
    /// Developer flag
    pub is_developer: bool,
}

/// Case-insensitive name equality used for uniqueness checks.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Tag `<prefix><sequence>`.
#[must_use]
pub fn format_tag(prefix: &str, sequence: usize) -> String {
    format!("{prefix}{sequence}")
}

/// Sequence number of `tag` under `prefix`, ignoring case.
///
/// `None` when the tag has another prefix or a non-numeric suffix.
#[must_use]
pub fn tag_sequence(tag: &str, prefix: &str) -> Option<usize> {
    let head = tag.get(..prefix.len())?;
    let digits = tag.get(prefix.len()..)?;
    if !head.eq_ignore_ascii_case(prefix)
        || digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue() -> Issue {
        let now = Utc::now();
        Issue {
            id: IssueId::new("iss-000000000001"),
            tag: "PST-0".to_string(),
            name: "App crash on save".to_string(),
            description: "Saving twice crashes".to_string(),
            reproduction: None,
            stack_trace: None,
            category: None,
            project: None,
            is_private: false,
            is_resolved: false,
            dev_notes: None,
            comments: Vec::new(),
            date: now,
            date_updated: now,
        }
    }

    fn comment(id: &str) -> Comment {
        Comment {
            id: CommentId::new(id),
            value: format!("comment {id}"),
            author: UserId::new("usr-000000000001"),
            date: Utc::now(),
        }
    }

    #[test]
    fn comments_are_newest_first() {
        let mut issue = sample_issue();
        issue.push_comment(comment("a")).unwrap();
        issue.push_comment(comment("b")).unwrap();

        let ids: Vec<&str> = issue.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn resolved_issue_rejects_comments() {
        let mut issue = sample_issue();
        issue.resolve(Some("fixed".to_string()), Utc::now());

        let err = issue.push_comment(comment("late")).unwrap_err();
        assert!(matches!(err, Error::Conflict { field: "issue", .. }));
        assert!(issue.comments.is_empty());
        assert!(issue.is_resolved);
    }

    #[test]
    fn resolving_twice_overwrites_notes() {
        let mut issue = sample_issue();
        issue.resolve(Some("first".to_string()), Utc::now());
        issue.resolve(Some("second".to_string()), Utc::now());

        assert!(issue.is_resolved);
        assert_eq!(issue.dev_notes.as_deref(), Some("second"));
    }

    #[test]
    fn tag_sequence_parses_own_prefix_only() {
        assert_eq!(tag_sequence("PST-12", "PST-"), Some(12));
        assert_eq!(tag_sequence("pst-3", "PST-"), Some(3));
        assert_eq!(tag_sequence("BUG-3", "PST-"), None);
        assert_eq!(tag_sequence("PST-", "PST-"), None);
        assert_eq!(tag_sequence("PST-1a", "PST-"), None);
        assert_eq!(tag_sequence("PST-+1", "PST-"), None);
    }

    #[test]
    fn tag_lookup_ignores_case() {
        let issue = sample_issue();
        assert!(issue.has_tag("pst-0"));
        assert!(issue.has_tag("PST-0"));
        assert!(!issue.has_tag("PST-01"));
    }

    #[test]
    fn search_matches_exact_tag_or_name_substring() {
        let issue = sample_issue();
        assert!(issue.matches_search("crash"));
        assert!(issue.matches_search("CRASH"));
        assert!(issue.matches_search("PST-0"));
        assert!(!issue.matches_search("pst-0"));
        assert!(!issue.matches_search("freeze"));
    }

    #[test]
    fn search_treats_query_literally() {
        let issue = sample_issue();
        assert!(!issue.matches_search("cr.sh"));
        assert!(!issue.matches_search(".*"));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut issue = sample_issue();
        issue.stack_trace = Some("at main".to_string());
        let json = serde_json::to_value(&issue).unwrap();

        assert_eq!(json["stackTrace"], "at main");
        assert_eq!(json["isResolved"], false);
        assert!(json.get("dateUpdated").is_some());
        assert!(json.get("devNotes").is_none());
    }

    #[test]
    fn integrity_rejects_notes_on_open_issue() {
        let mut issue = sample_issue();
        assert!(issue.check_integrity().is_ok());
        issue.dev_notes = Some("stray".to_string());
        assert!(issue.check_integrity().is_err());
    }

    #[test]
    fn names_match_ignores_case_and_padding() {
        assert!(names_match("Backend", " backend "));
        assert!(!names_match("Backend", "Frontend"));
    }
}
