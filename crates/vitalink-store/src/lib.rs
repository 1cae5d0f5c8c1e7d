//! File-backed JSON-lines stores.
//!
//! Every persistent store in the system is a single text file, one
//! sorted-key JSON object per line, with an in-memory index rebuilt at
//! startup. A store is its state's single mutation authority: all
//! operations run under one mutex, which makes `consume`-style removals
//! and check-then-insert atomic under concurrent requests.

mod appender;
mod error;
mod jsonl;

pub use appender::JsonlAppender;
pub use error::StoreError;
pub use jsonl::{JsonlStore, StoreEntry};
