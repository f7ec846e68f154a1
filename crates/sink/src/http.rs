//! HTTP sink posting to the feed-history endpoints.
//!
//! This module delivers reports to a feed backend over its per-article
//! REST routes: `/feed-history/{id}/progress`, `/mark-read` and
//! `/mark-unread`.

use async_trait::async_trait;
use readtrace_core::{ArticleId, ProgressReport};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::trait_::{ProgressSink, Result, SinkError};

/// Timeout applied to every outgoing request.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Sink that posts reports to a feed backend over HTTP.
#[derive(Clone)]
pub struct HttpProgressSink {
    /// HTTP client
    client: Client,

    /// Backend base URL, without trailing slash
    base_url: String,
}

impl HttpProgressSink {
    /// Create a sink for the backend at `base_url`.
    ///
    /// A trailing slash on the base URL is trimmed so endpoint paths
    /// join cleanly.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(
            ClientBuilder::new()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url,
        )
    }

    /// Create a sink using a caller-supplied client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint(&self, article: &ArticleId, action: &str) -> String {
        format!("{}/feed-history/{}/{}", self.base_url, article, action)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, endpoint: String, payload: &T) -> Result<()> {
        let response = self.client.post(&endpoint).json(payload).send().await?;

        if !response.status().is_success() {
            return Err(SinkError::Status {
                status: response.status(),
                endpoint,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ProgressSink for HttpProgressSink {
    async fn record_progress(&self, article: &ArticleId, report: ProgressReport) -> Result<()> {
        debug!(
            "Posting progress for {}: position {:.3}, duration {}s",
            article, report.position, report.duration
        );
        self.post_json(self.endpoint(article, "progress"), &report)
            .await
    }

    async fn set_read_state(&self, article: &ArticleId, read: bool) -> Result<()> {
        let action = if read { "mark-read" } else { "mark-unread" };
        debug!("Posting {} for {}", action, article);
        self.post_json(self.endpoint(article, action), &json!({}))
            .await
    }
}
