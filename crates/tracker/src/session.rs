//! Per-article session state.

use readtrace_core::{ArticleId, ProgressReport, SessionId, Time};
use tokio::time::Instant;

/// State for one tracked article.
///
/// Owned exclusively by the session worker task, so every mutation is
/// strictly ordered with respect to the reports snapshotted from it.
#[derive(Debug)]
pub struct TrackingSession {
    /// Session identity, for log correlation
    pub id: SessionId,

    /// Article being read
    pub article: ArticleId,

    /// Wall-clock time the session opened
    pub opened_at: Time,

    /// When the current active-reading span began
    span_started: Instant,

    /// Last position compared against or delivered
    last_position: f64,
}

impl TrackingSession {
    /// Open a session for an article, anchoring the first reading span.
    pub fn begin(article: ArticleId) -> Self {
        Self {
            id: SessionId::new(),
            article,
            opened_at: chrono::Utc::now(),
            span_started: Instant::now(),
            last_position: 0.0,
        }
    }

    /// The last recorded reading position.
    pub fn last_position(&self) -> f64 {
        self.last_position
    }

    /// Whole seconds elapsed in the current reading span.
    pub fn span_seconds(&self) -> u64 {
        self.span_started.elapsed().as_secs()
    }

    /// Restart the reading span so earlier time stops counting.
    pub fn restart_span(&mut self) {
        self.span_started = Instant::now();
    }

    /// Record a settled position.
    ///
    /// Returns true when it differs from the last recorded one, which
    /// is the signal that a report should go out.
    pub fn record_position(&mut self, position: f64) -> bool {
        let position = position.clamp(0.0, 1.0);
        if position == self.last_position {
            return false;
        }
        self.last_position = position;
        true
    }

    /// Snapshot the current position and span duration as a report.
    pub fn report(&self) -> ProgressReport {
        ProgressReport::new(self.last_position, self.span_seconds())
    }
}
