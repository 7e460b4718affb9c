//! HTTP API server for pesticide issue tracking.
//!
//! This crate exposes the [`pesticide::service::IssueService`] over a small
//! JSON API built on `axum`. Every route lives under `/api`.
//!
//! # Routes
//!
//! ## Issues
//! - `GET /issues` - List every issue, newest first
//! - `POST /issues/newIssue` - File an issue (bearer)
//! - `POST /issues/v/{tag}` - View one issue; private issues need an admin developer
//! - `POST /issues/v/{tag}/comment` - Comment on an open issue (bearer)
//! - `PUT /issues/v/{tag}/close` - Resolve an issue (bearer, admin or developer)
//! - `GET /search/{query}` - Search by tag or name
//!
//! ## Catalog
//! - `POST /issues/newCategory` - Create a category (bearer, admin)
//! - `POST /issues/newProject` - Create a project (bearer, admin)
//! - `GET /issues/getCategories` - List categories (bearer)
//! - `GET /issues/getProjects` - List projects (bearer)
//!
//! ## Users
//! - `GET /users/permissions` - Role flags of the caller (bearer)
//!
//! Routes marked bearer answer 401 to a missing or invalid token. The view
//! route treats an invalid token as no token.

pub mod context;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use error::{Error, Result};
pub use server::PesticideServer;
