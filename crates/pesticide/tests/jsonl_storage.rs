//! Persistence tests for the JSONL-backed storage.

use pesticide::domain::{
    NewCategoryInput, NewCommentInput, NewIssueInput, NewProjectInput, NewUser, ResolveInput,
};
use pesticide::error::ErrorKind;
use pesticide::service::IssueService;
use pesticide::storage::in_memory::{ISSUES_FILE_NAME, LoadWarning, load_from_jsonl};
use serde_json::Value;
use pesticide::storage::{StorageBackend, create_storage};
use std::path::Path;
use tempfile::TempDir;

async fn open(data_dir: &Path) -> IssueService {
    let storage = create_storage(StorageBackend::Jsonl(data_dir.to_path_buf()))
        .await
        .unwrap();
    IssueService::new(storage, "PST-")
}

fn admin() -> NewUser {
    NewUser {
        username: "admin".to_string(),
        is_admin: true,
        is_developer: true,
    }
}

fn issue_input(name: &str) -> NewIssueInput {
    NewIssueInput {
        name: name.to_string(),
        description: "Steps unknown".to_string(),
        ..NewIssueInput::default()
    }
}

#[tokio::test]
async fn all_collections_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");

    let before = {
        let service = open(&data_dir).await;
        let user = service.register_user(admin()).await.unwrap();
        let category = service
            .create_category(
                NewCategoryInput {
                    category_name: "UI".to_string(),
                },
                Some(&user.id),
            )
            .await
            .unwrap();
        let project = service
            .create_project(
                NewProjectInput {
                    name: "Web".to_string(),
                },
                Some(&user.id),
            )
            .await
            .unwrap();

        let input = NewIssueInput {
            category: Some(category.id),
            project: Some(project.id),
            is_private: true,
            stack_trace: Some("at main.rs:1".to_string()),
            ..issue_input("Crash on start")
        };
        service.create_issue(input, Some(&user.id)).await.unwrap();
        service
            .add_comment(
                "PST-0",
                Some(&user.id),
                NewCommentInput {
                    comment: "Seen on linux too".to_string(),
                },
            )
            .await
            .unwrap();
        service
            .resolve_issue(
                "PST-0",
                Some(&user.id),
                ResolveInput {
                    dev_notes: Some("Null check added".to_string()),
                },
            )
            .await
            .unwrap();

        service.storage().read().await.export_all().await.unwrap()
    };

    let reopened = open(&data_dir).await;
    let after = reopened.storage().read().await.export_all().await.unwrap();
    assert_eq!(before, after);

    let user = reopened.find_user("ADMIN").await.unwrap();
    let issue = reopened
        .get_issue_by_tag("pst-0", Some(&user.id))
        .await
        .unwrap();
    assert!(issue.is_resolved);
    assert_eq!(issue.comments.len(), 1);
    assert_eq!(issue.project.map(|p| p.name), Some("Web".to_string()));

    let next = reopened
        .create_issue(issue_input("Second"), Some(&user.id))
        .await
        .unwrap();
    assert_eq!(next.tag, "PST-1");
}

#[tokio::test]
async fn missing_data_dir_opens_empty() {
    let temp = TempDir::new().unwrap();
    let service = open(&temp.path().join("never-created")).await;
    assert!(service.list_public_issues().await.unwrap().is_empty());
    assert!(service.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupted_lines_are_skipped_with_warnings() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");

    {
        let service = open(&data_dir).await;
        let user = service.register_user(admin()).await.unwrap();
        service
            .create_issue(issue_input("Kept"), Some(&user.id))
            .await
            .unwrap();
    }

    let issues_path = data_dir.join(ISSUES_FILE_NAME);
    let mut content = std::fs::read_to_string(&issues_path).unwrap();
    content.push_str("{ this is not json\n");
    std::fs::write(&issues_path, content).unwrap();

    let (storage, warnings) = load_from_jsonl(&data_dir).await.unwrap();
    assert_eq!(storage.list_issues().await.unwrap().len(), 1);
    assert!(warnings.iter().any(|w| matches!(
        w,
        LoadWarning::MalformedJson {
            file: ISSUES_FILE_NAME,
            line_number: 2,
            ..
        }
    )));
}

#[tokio::test]
async fn failed_save_rolls_back_to_disk_state() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");

    let service = open(&data_dir).await;
    let user = service.register_user(admin()).await.unwrap();
    service
        .create_issue(issue_input("Persisted"), Some(&user.id))
        .await
        .unwrap();

    // Blocks the temporary file the atomic writer needs.
    std::fs::create_dir(data_dir.join(format!("{ISSUES_FILE_NAME}.tmp"))).unwrap();

    let err = service
        .create_issue(issue_input("Lost"), Some(&user.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    let issues = service.list_public_issues().await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].name, "Persisted");
}

#[tokio::test]
async fn skipped_issue_line_does_not_reuse_a_tag() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");

    {
        let service = open(&data_dir).await;
        let user = service.register_user(admin()).await.unwrap();
        for name in ["a", "b", "c"] {
            service
                .create_issue(issue_input(name), Some(&user.id))
                .await
                .unwrap();
        }
    }

    let issues_path = data_dir.join(ISSUES_FILE_NAME);
    let content = std::fs::read_to_string(&issues_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    std::fs::write(
        &issues_path,
        format!("{}\n{{ truncated\n{}\n", lines[0], lines[2]),
    )
    .unwrap();

    let service = open(&data_dir).await;
    let user = service.find_user("admin").await.unwrap();
    let fresh = service
        .create_issue(issue_input("fresh"), Some(&user.id))
        .await
        .unwrap();
    assert_eq!(fresh.tag, "PST-3");

    let old = service.get_issue_by_tag("PST-2", None).await.unwrap();
    assert_eq!(old.name, "c");
    let new = service.get_issue_by_tag("PST-3", None).await.unwrap();
    assert_eq!(new.name, "fresh");
}

#[tokio::test]
async fn duplicate_tags_on_disk_are_reported_and_kept() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");

    {
        let service = open(&data_dir).await;
        let user = service.register_user(admin()).await.unwrap();
        service
            .create_issue(issue_input("original"), Some(&user.id))
            .await
            .unwrap();
    }

    let issues_path = data_dir.join(ISSUES_FILE_NAME);
    let content = std::fs::read_to_string(&issues_path).unwrap();
    let mut copy: Value = serde_json::from_str(content.trim()).unwrap();
    copy["id"] = Value::String("iss-copy00000000".to_string());
    copy["name"] = Value::String("copy".to_string());
    std::fs::write(&issues_path, format!("{}{copy}\n", content)).unwrap();

    let (storage, warnings) = load_from_jsonl(&data_dir).await.unwrap();
    assert_eq!(storage.list_issues().await.unwrap().len(), 2);
    assert!(warnings.iter().any(|w| matches!(
        w,
        LoadWarning::DuplicateTag { tag, .. } if tag == "PST-0"
    )));
    assert_eq!(storage.next_issue_sequence("PST-").await.unwrap(), 2);
}
