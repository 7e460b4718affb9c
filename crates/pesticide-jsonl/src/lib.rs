//! JSON Lines persistence helpers for pesticide.
//!
//! Every pesticide collection (issues, categories, projects, users) is stored
//! as one JSON document per line. This crate provides the buffered reader and
//! writer for that format, a resilient whole-file loader that skips damaged
//! lines instead of failing, and crash-safe atomic file replacement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::write_jsonl_atomic;
pub use error::{Error, Result};
pub use reader::{read_jsonl_resilient, JsonlReader};
pub use warning::Warning;
pub use writer::JsonlWriter;
