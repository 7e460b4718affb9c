//! JSONL persistence for in-memory storage.
//!
//! A data directory holds one file per collection. Files are read resiliently
//! and written atomically, each in creation order.

use super::inner::InMemoryStorageInner;
use crate::domain::{Category, Issue, Project, User, names_match};
use crate::error::{Error, Result, StorageError};
use crate::storage::IssueStorage;
use pesticide_jsonl::{Warning as JsonlWarning, read_jsonl_resilient, write_jsonl_atomic};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// File holding issues
pub const ISSUES_FILE_NAME: &str = "issues.jsonl";

/// File holding categories
pub const CATEGORIES_FILE_NAME: &str = "categories.jsonl";

/// File holding projects
pub const PROJECTS_FILE_NAME: &str = "projects.jsonl";

/// File holding users
pub const USERS_FILE_NAME: &str = "users.jsonl";

/// Non-fatal problems found while loading a data directory.
///
/// The offending line or record is skipped; everything else loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line that could not be parsed
    MalformedJson {
        /// Data file name
        file: &'static str,
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// Record that parsed but failed integrity checks
    InvalidRecord {
        /// Data file name
        file: &'static str,
        /// Record id, if it had one
        record_id: String,
        /// Why it was rejected
        error: String,
    },

    /// Record whose id, or unique name, was already loaded
    DuplicateRecord {
        /// Data file name
        file: &'static str,
        /// Record id
        record_id: String,
    },

    /// Issue whose tag, ignoring case, was already loaded.
    ///
    /// The record is kept so saving does not drop it, but tag lookups reach
    /// only the first issue with the tag.
    DuplicateTag {
        /// Record id of the later issue
        record_id: String,
        /// Shared tag
        tag: String,
    },
}

/// Load storage from a data directory.
///
/// Missing files load as empty collections.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read.
pub async fn load_from_jsonl(
    data_dir: &Path,
) -> Result<(Box<dyn IssueStorage>, Vec<LoadWarning>)> {
    let mut warnings = Vec::new();

    let users: Vec<User> = read_collection(data_dir, USERS_FILE_NAME, &mut warnings).await?;
    let categories: Vec<Category> =
        read_collection(data_dir, CATEGORIES_FILE_NAME, &mut warnings).await?;
    let projects: Vec<Project> =
        read_collection(data_dir, PROJECTS_FILE_NAME, &mut warnings).await?;
    let issues: Vec<Issue> = read_collection(data_dir, ISSUES_FILE_NAME, &mut warnings).await?;

    let mut inner = InMemoryStorageInner::new();
    let mut seen = HashSet::new();

    for user in users {
        if !seen.insert(user.id.to_string())
            || inner.users.iter().any(|u| names_match(&u.username, &user.username))
        {
            warnings.push(LoadWarning::DuplicateRecord {
                file: USERS_FILE_NAME,
                record_id: user.id.to_string(),
            });
            continue;
        }
        inner.insert_user(user);
    }

    for category in categories {
        if !seen.insert(category.id.to_string())
            || inner.categories.iter().any(|c| names_match(&c.name, &category.name))
        {
            warnings.push(LoadWarning::DuplicateRecord {
                file: CATEGORIES_FILE_NAME,
                record_id: category.id.to_string(),
            });
            continue;
        }
        inner.insert_category(category);
    }

    for project in projects {
        if !seen.insert(project.id.to_string())
            || inner.projects.iter().any(|p| names_match(&p.name, &project.name))
        {
            warnings.push(LoadWarning::DuplicateRecord {
                file: PROJECTS_FILE_NAME,
                record_id: project.id.to_string(),
            });
            continue;
        }
        inner.insert_project(project);
    }

    for issue in issues {
        if let Err(error) = issue.check_integrity() {
            warnings.push(LoadWarning::InvalidRecord {
                file: ISSUES_FILE_NAME,
                record_id: issue.id.to_string(),
                error,
            });
            continue;
        }
        if !seen.insert(issue.id.to_string()) {
            warnings.push(LoadWarning::DuplicateRecord {
                file: ISSUES_FILE_NAME,
                record_id: issue.id.to_string(),
            });
            continue;
        }
        if inner.issues.iter().any(|i| i.has_tag(&issue.tag)) {
            warnings.push(LoadWarning::DuplicateTag {
                record_id: issue.id.to_string(),
                tag: issue.tag.clone(),
            });
        }
        inner.insert_issue(issue);
    }

    Ok((Box::new(Arc::new(Mutex::new(inner))), warnings))
}

async fn read_collection<T: DeserializeOwned>(
    data_dir: &Path,
    file: &'static str,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Vec<T>> {
    let path = data_dir.join(file);
    if !tokio::fs::try_exists(&path).await? {
        return Ok(Vec::new());
    }

    let (records, jsonl_warnings) =
        read_jsonl_resilient::<T, _>(&path)
            .await
            .map_err(StorageError::from)?;

    warnings.extend(jsonl_warnings.into_iter().map(|w| match w {
        JsonlWarning::MalformedJson { line_number, error } => LoadWarning::MalformedJson {
            file,
            line_number,
            error,
        },
        JsonlWarning::SkippedLine {
            line_number,
            reason,
        } => LoadWarning::MalformedJson {
            file,
            line_number,
            error: reason,
        },
    }));

    Ok(records)
}

/// Save storage to a data directory.
///
/// Each collection file is replaced atomically; the directory is created if
/// needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be written.
pub async fn save_to_jsonl(storage: &dyn IssueStorage, data_dir: &Path) -> Result<()> {
    let snapshot = storage.export_all().await?;

    tokio::fs::create_dir_all(data_dir).await.map_err(Error::Io)?;

    write_jsonl_atomic(data_dir.join(USERS_FILE_NAME), snapshot.users.as_slice())
        .await
        .map_err(StorageError::from)?;
    write_jsonl_atomic(data_dir.join(CATEGORIES_FILE_NAME), snapshot.categories.as_slice())
        .await
        .map_err(StorageError::from)?;
    write_jsonl_atomic(data_dir.join(PROJECTS_FILE_NAME), snapshot.projects.as_slice())
        .await
        .map_err(StorageError::from)?;
    write_jsonl_atomic(data_dir.join(ISSUES_FILE_NAME), snapshot.issues.as_slice())
        .await
        .map_err(StorageError::from)?;

    tracing::debug!(
        data_dir = %data_dir.display(),
        issues = snapshot.issues.len(),
        "Saved storage to JSONL"
    );
    Ok(())
}
