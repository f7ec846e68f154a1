//! Unique identifiers for readtrace entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Error returned when an article identifier fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("article id must not be empty")]
pub struct InvalidArticleId;

/// Opaque identifier of a content item, assigned by the backend.
///
/// The tracker never interprets it; it only flows into the per-article
/// reporting endpoints. The empty string is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleId(String);

impl ArticleId {
    /// Create an article id from a backend-assigned identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidArticleId> {
        let id = id.into();
        if id.is_empty() {
            return Err(InvalidArticleId);
        }
        Ok(Self(id))
    }

    /// View the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ArticleId {
    type Err = InvalidArticleId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Unique identifier for a tracking session.
///
/// Exists for log correlation; the wire protocol never carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Ulid);

impl SessionId {
    /// Generate a new SessionId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
