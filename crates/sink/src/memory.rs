//! In-memory sink for tests and local use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use readtrace_core::{ArticleId, ProgressReport, Time};
use tokio::sync::Mutex;

use crate::trait_::{ProgressSink, Result, SinkError};

/// A delivery captured by [`MemoryProgressSink`].
#[derive(Debug, Clone)]
pub struct RecordedReport {
    /// Article the report belongs to
    pub article: ArticleId,
    /// The delivered payload
    pub report: ProgressReport,
    /// When the sink accepted it
    pub recorded_at: Time,
}

/// Sink that records deliveries in memory.
///
/// Clones share the same log, so a test can hand one clone to the
/// engine and inspect the other. Deliveries can be made to fail on
/// demand to exercise the drop-on-error path.
#[derive(Clone, Default)]
pub struct MemoryProgressSink {
    reports: Arc<Mutex<Vec<RecordedReport>>>,
    read_states: Arc<Mutex<Vec<(ArticleId, bool)>>>,
    fail_delivery: Arc<AtomicBool>,
}

impl MemoryProgressSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn fail_delivery(&self, fail: bool) {
        self.fail_delivery.store(fail, Ordering::SeqCst);
    }

    /// All progress deliveries, in arrival order.
    pub async fn reports(&self) -> Vec<RecordedReport> {
        self.reports.lock().await.clone()
    }

    /// Progress payloads delivered for one article, in arrival order.
    pub async fn reports_for(&self, article: &ArticleId) -> Vec<ProgressReport> {
        self.reports
            .lock()
            .await
            .iter()
            .filter(|r| &r.article == article)
            .map(|r| r.report)
            .collect()
    }

    /// All read-state changes, in arrival order.
    pub async fn read_states(&self) -> Vec<(ArticleId, bool)> {
        self.read_states.lock().await.clone()
    }

    fn check_delivery(&self) -> Result<()> {
        if self.fail_delivery.load(Ordering::SeqCst) {
            return Err(SinkError::Other("delivery failure injected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressSink for MemoryProgressSink {
    async fn record_progress(&self, article: &ArticleId, report: ProgressReport) -> Result<()> {
        self.check_delivery()?;
        self.reports.lock().await.push(RecordedReport {
            article: article.clone(),
            report,
            recorded_at: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn set_read_state(&self, article: &ArticleId, read: bool) -> Result<()> {
        self.check_delivery()?;
        self.read_states.lock().await.push((article.clone(), read));
        Ok(())
    }
}
