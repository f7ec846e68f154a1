//! Sink trait abstraction.

use async_trait::async_trait;
use readtrace_core::{ArticleId, ProgressReport};

/// Error type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors that can occur while delivering reports.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Transport-level failure (connection, timeout, body)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("endpoint {endpoint} answered {status}")]
    Status {
        /// HTTP status returned by the endpoint
        status: reqwest::StatusCode,
        /// Endpoint that produced the status
        endpoint: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Destination for reading activity.
///
/// This trait allows different delivery backends to be plugged in.
/// Callers treat every method as fire-and-forget: a failed delivery is
/// logged and dropped, never retried.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Record the current position and accumulated reading duration.
    async fn record_progress(&self, article: &ArticleId, report: ProgressReport) -> Result<()>;

    /// Record that an article was opened, before any reading happened.
    async fn mark_opened(&self, article: &ArticleId) -> Result<()> {
        self.record_progress(article, ProgressReport::opened()).await
    }

    /// Set the read flag of an article.
    async fn set_read_state(&self, article: &ArticleId, read: bool) -> Result<()>;
}
