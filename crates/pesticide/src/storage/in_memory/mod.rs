//! In-memory storage backend.
//!
//! All collections live in one [`InMemoryStorageInner`] behind an
//! `Arc<tokio::sync::Mutex<_>>`. Every trait method acquires the mutex once,
//! so read-modify-write operations such as appending a comment are atomic with
//! respect to each other.
//!
//! Issues are kept in a `Vec` in creation order with a `HashMap` index from id
//! to position; reference collections are small and scanned linearly.
//!
//! # Persistence
//!
//! [`load_from_jsonl`] and [`save_to_jsonl`] move the whole state to and from
//! a data directory. The storage wrapper in the parent module calls them from
//! `reload()` and `save()`.

mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::IssueStorage;
use inner::InMemoryStorageInner;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use jsonl::{
    CATEGORIES_FILE_NAME, ISSUES_FILE_NAME, LoadWarning, PROJECTS_FILE_NAME, USERS_FILE_NAME,
    load_from_jsonl, save_to_jsonl,
};

/// Thread-safe in-memory storage.
pub(crate) type InMemoryStorage = Arc<Mutex<InMemoryStorageInner>>;

/// Create a new, empty in-memory storage instance.
///
/// # Example
///
/// ```
/// use pesticide::storage::in_memory::new_in_memory_storage;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let storage = new_in_memory_storage();
///     assert!(storage.list_issues().await.unwrap().is_empty());
/// }
/// ```
#[must_use]
pub fn new_in_memory_storage() -> Box<dyn IssueStorage> {
    Box::new(Arc::new(Mutex::new(InMemoryStorageInner::new())))
}
