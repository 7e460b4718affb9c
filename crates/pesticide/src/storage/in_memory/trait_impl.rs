//! `IssueStorage` trait implementation for in-memory storage.

use super::InMemoryStorage;
use crate::domain::{
    Category, CategoryId, Comment, CommentId, Issue, IssueId, NewIssue, NewUser, Project,
    ProjectId, User, UserId, names_match,
};
use crate::error::{Error, Result};
use crate::id_generation::IdKind;
use crate::storage::{IssueStorage, Snapshot};
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl IssueStorage for InMemoryStorage {
    async fn next_issue_sequence(&self, prefix: &str) -> Result<usize> {
        Ok(self.lock().await.next_issue_sequence(prefix))
    }

    async fn create_issue(&mut self, new_issue: NewIssue) -> Result<Issue> {
        let mut inner = self.lock().await;

        if inner.issues.iter().any(|i| i.has_tag(&new_issue.tag)) {
            return Err(Error::duplicate_tag(&new_issue.tag));
        }

        let id = IssueId::new(inner.generate_id(IdKind::Issue, &new_issue.name)?);
        let now = Utc::now();

        let issue = Issue {
            id,
            tag: new_issue.tag,
            name: new_issue.name,
            description: new_issue.description,
            reproduction: new_issue.reproduction,
            stack_trace: new_issue.stack_trace,
            category: new_issue.category,
            project: new_issue.project,
            is_private: new_issue.is_private,
            is_resolved: false,
            dev_notes: None,
            comments: Vec::new(),
            date: now,
            date_updated: now,
        };

        inner.insert_issue(issue.clone());
        Ok(issue)
    }

    async fn find_issue_by_tag(&self, tag: &str) -> Result<Option<Issue>> {
        let inner = self.lock().await;
        Ok(inner.issues.iter().find(|i| i.has_tag(tag)).cloned())
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        let inner = self.lock().await;
        Ok(inner.issues.iter().rev().cloned().collect())
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>> {
        let inner = self.lock().await;
        Ok(inner
            .issues
            .iter()
            .filter(|i| i.matches_search(query))
            .cloned()
            .collect())
    }

    async fn add_comment(
        &mut self,
        id: &IssueId,
        author: &UserId,
        value: String,
    ) -> Result<Issue> {
        let mut inner = self.lock().await;

        if inner.issue(id).is_none() {
            return Err(Error::IssueNotFound(id.to_string()));
        }
        let comment = Comment {
            id: CommentId::new(inner.generate_id(IdKind::Comment, &value)?),
            value,
            author: author.clone(),
            date: Utc::now(),
        };

        let issue = inner.issue_mut(id)?;
        issue.push_comment(comment)?;
        Ok(issue.clone())
    }

    async fn resolve_issue(&mut self, id: &IssueId, dev_notes: Option<String>) -> Result<Issue> {
        let mut inner = self.lock().await;
        let issue = inner.issue_mut(id)?;
        issue.resolve(dev_notes, Utc::now());
        Ok(issue.clone())
    }

    async fn create_category(&mut self, name: &str) -> Result<Category> {
        let mut inner = self.lock().await;
        let name = name.trim();

        if inner.categories.iter().any(|c| names_match(&c.name, name)) {
            return Err(Error::duplicate_title("category"));
        }

        let category = Category {
            id: CategoryId::new(inner.generate_id(IdKind::Category, name)?),
            name: name.to_string(),
            date: Utc::now(),
        };
        inner.insert_category(category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.lock().await.categories.clone())
    }

    async fn create_project(&mut self, name: &str) -> Result<Project> {
        let mut inner = self.lock().await;
        let name = name.trim();

        if inner.projects.iter().any(|p| names_match(&p.name, name)) {
            return Err(Error::duplicate_title("project"));
        }

        let project = Project {
            id: ProjectId::new(inner.generate_id(IdKind::Project, name)?),
            name: name.to_string(),
            date: Utc::now(),
        };
        inner.insert_project(project.clone());
        Ok(project)
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.lock().await.projects.clone())
    }

    async fn create_user(&mut self, new_user: NewUser) -> Result<User> {
        let mut inner = self.lock().await;
        let username = new_user.username.trim();

        if inner.users.iter().any(|u| names_match(&u.username, username)) {
            return Err(Error::Conflict {
                field: "username",
                message: format!("User '{username}' already exists"),
            });
        }

        let user = User {
            id: UserId::new(inner.generate_id(IdKind::User, username)?),
            username: username.to_string(),
            is_admin: new_user.is_admin,
            is_developer: new_user.is_developer,
            date: Utc::now(),
        };
        inner.insert_user(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let inner = self.lock().await;
        Ok(inner.users.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.lock().await;
        Ok(inner
            .users
            .iter()
            .find(|u| names_match(&u.username, username))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.lock().await.users.clone())
    }

    async fn export_all(&self) -> Result<Snapshot> {
        Ok(self.lock().await.snapshot())
    }

    async fn save(&self) -> Result<()> {
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
