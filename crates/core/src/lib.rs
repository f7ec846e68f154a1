//! Readtrace core data models.
//!
//! This crate defines the identifiers and payload types shared by the
//! reading-progress engine and its reporting backends.

#![warn(missing_docs)]

// Core identities
mod id;

// Wire payloads
mod report;

// Re-exports
pub use id::{ArticleId, InvalidArticleId, SessionId};
pub use report::ProgressReport;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
