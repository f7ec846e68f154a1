//! Instantiable reading tracker.

use std::sync::Arc;

use readtrace_core::ArticleId;
use readtrace_sink::ProgressSink;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::{PageEvent, ScrollMetrics, Visibility};
use crate::session::TrackingSession;
use crate::worker;

/// Default interval between unconditional background syncs.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Default quiet window a scroll burst must settle for.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Error type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors surfaced by tracker lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The session worker task panicked or was aborted
    #[error("session worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Timing knobs of the tracking engine.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Interval between unconditional background syncs
    pub sync_interval: Duration,

    /// Quiet window a scroll burst must settle for
    pub debounce_window: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sync_interval: SYNC_INTERVAL,
            debounce_window: DEBOUNCE_WINDOW,
        }
    }
}

/// Handle to one open session's worker task.
struct ActiveSession {
    /// Article the session tracks
    article: ArticleId,

    /// Event feed into the worker
    events: mpsc::UnboundedSender<PageEvent>,

    /// Cancelling this asks the worker to flush and exit
    cancel: CancellationToken,

    /// The worker itself
    worker: JoinHandle<()>,
}

/// Reading-progress engine for one reader surface.
///
/// At most one article is tracked at a time. The host pushes page
/// events in; reports flow out through the sink, fire-and-forget: no
/// public operation ever waits on a delivery or sees its failure.
pub struct ReadingTracker {
    sink: Arc<dyn ProgressSink>,
    config: TrackerConfig,
    active: Option<ActiveSession>,
}

impl ReadingTracker {
    /// Create a tracker delivering through `sink`, with default timing.
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self::with_config(sink, TrackerConfig::default())
    }

    /// Create a tracker with explicit timing knobs.
    pub fn with_config(sink: Arc<dyn ProgressSink>, config: TrackerConfig) -> Self {
        Self {
            sink,
            config,
            active: None,
        }
    }

    /// Start tracking an article.
    ///
    /// Any open session is stopped first, flushing its final report, so
    /// switching articles never interleaves two sessions.
    pub async fn start(&mut self, article: ArticleId) -> Result<()> {
        self.stop().await?;

        let session = TrackingSession::begin(article.clone());
        let started = Instant::now();
        info!("Tracking {} (session {})", session.article, session.id);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(worker::session_loop(
            session,
            started,
            Arc::clone(&self.sink),
            self.config,
            events_rx,
            cancel.clone(),
        ));

        self.active = Some(ActiveSession {
            article,
            events: events_tx,
            cancel,
            worker,
        });
        Ok(())
    }

    /// Stop the open session, if any.
    ///
    /// The worker emits one final report on its way out; the delivery
    /// itself stays fire-and-forget and is never awaited here. A no-op
    /// when idle.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        active.cancel.cancel();
        active.worker.await?;
        debug!("Stopped tracking {}", active.article);
        Ok(())
    }

    /// Feed one page event into the open session.
    ///
    /// Dropped silently while idle.
    pub fn handle_event(&self, event: PageEvent) {
        if let Some(active) = &self.active {
            let _ = active.events.send(event);
        }
    }

    /// Feed a scroll observation into the open session.
    pub fn on_scroll(&self, metrics: ScrollMetrics) {
        self.handle_event(PageEvent::Scrolled(metrics));
    }

    /// Feed a visibility change into the open session.
    pub fn on_visibility_change(&self, visibility: Visibility) {
        self.handle_event(PageEvent::VisibilityChanged(visibility));
    }

    /// Whether a session is open.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The article currently tracked, if any.
    pub fn active_article(&self) -> Option<&ArticleId> {
        self.active.as_ref().map(|a| &a.article)
    }
}

impl Drop for ReadingTracker {
    fn drop(&mut self) {
        // Best-effort teardown when the owner never called stop
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readtrace_sink::MemoryProgressSink;
    use tokio::time::advance;

    fn create_test_article(id: &str) -> ArticleId {
        ArticleId::new(id).unwrap()
    }

    fn create_test_metrics(content_top: f64) -> ScrollMetrics {
        ScrollMetrics {
            content_top,
            content_height: 3000.0,
            viewport_height: 800.0,
        }
    }

    fn create_test_tracker() -> (ReadingTracker, MemoryProgressSink) {
        let sink = MemoryProgressSink::new();
        let tracker = ReadingTracker::new(Arc::new(sink.clone()));
        (tracker, sink)
    }

    /// Let the worker and any spawned deliveries run to completion.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_burst_settles_to_one_report() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-1");
        tracker.start(article.clone()).await.unwrap();

        // Each scroll inside the quiet window re-arms the debounce
        tracker.on_scroll(create_test_metrics(-550.0));
        settle().await;
        advance(Duration::from_millis(300)).await;
        settle().await;
        assert!(sink.reports().await.is_empty());

        tracker.on_scroll(create_test_metrics(-1100.0));
        settle().await;
        advance(Duration::from_millis(300)).await;
        settle().await;
        assert!(sink.reports().await.is_empty());

        advance(Duration::from_millis(200)).await;
        settle().await;

        let reports = sink.reports_for(&article).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].position, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_scroll_reports_position_and_elapsed() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-42");
        tracker.start(article.clone()).await.unwrap();

        advance(Duration::from_secs(2)).await;
        // 814px into a 2200px scrollable range settles at 0.37
        tracker.on_scroll(create_test_metrics(-814.0));
        settle().await;
        advance(DEBOUNCE_WINDOW).await;
        settle().await;

        let reports = sink.reports_for(&article).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].position, 0.37);
        assert_eq!(reports[0].duration, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_position_emits_nothing() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-1");
        tracker.start(article.clone()).await.unwrap();

        tracker.on_scroll(create_test_metrics(-2500.0));
        settle().await;
        advance(DEBOUNCE_WINDOW).await;
        settle().await;
        assert_eq!(sink.reports_for(&article).await.len(), 1);

        // A different overshoot clamps to the same settled position
        tracker.on_scroll(create_test_metrics(-3000.0));
        settle().await;
        advance(DEBOUNCE_WINDOW).await;
        settle().await;

        let reports = sink.reports_for(&article).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].position, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_sync_carries_span_duration() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-1");
        tracker.start(article.clone()).await.unwrap();

        advance(SYNC_INTERVAL).await;
        settle().await;
        advance(SYNC_INTERVAL).await;
        settle().await;

        let reports = sink.reports_for(&article).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].duration, 30);
        assert_eq!(reports[1].duration, 60);
        assert_eq!(reports[0].position, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_flushes_immediately() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-1");
        tracker.start(article.clone()).await.unwrap();

        tracker.on_scroll(create_test_metrics(-1100.0));
        settle().await;
        advance(DEBOUNCE_WINDOW).await;
        settle().await;

        // No clock movement: the flush must not wait for anything
        tracker.on_visibility_change(Visibility::Hidden);
        settle().await;

        let reports = sink.reports_for(&article).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].position, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regaining_visibility_excludes_hidden_time() {
        let sink = MemoryProgressSink::new();
        let config = TrackerConfig {
            sync_interval: Duration::from_secs(300),
            debounce_window: DEBOUNCE_WINDOW,
        };
        let mut tracker = ReadingTracker::with_config(Arc::new(sink.clone()), config);
        let article = create_test_article("art-1");
        tracker.start(article.clone()).await.unwrap();

        advance(Duration::from_secs(10)).await;
        tracker.on_visibility_change(Visibility::Hidden);
        settle().await;

        advance(Duration::from_secs(15)).await;
        tracker.on_visibility_change(Visibility::Visible);
        settle().await;

        advance(Duration::from_secs(5)).await;
        tracker.on_visibility_change(Visibility::Hidden);
        settle().await;

        let reports = sink.reports_for(&article).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].duration, 10);
        // 15 hidden seconds dropped by the span restart
        assert_eq!(reports[1].duration, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_flushes_prior_article_once() {
        let (mut tracker, sink) = create_test_tracker();
        let first = create_test_article("art-1");
        let second = create_test_article("art-2");

        tracker.start(first.clone()).await.unwrap();
        tracker.on_scroll(create_test_metrics(-1100.0));
        settle().await;
        advance(DEBOUNCE_WINDOW).await;
        settle().await;

        tracker.start(second.clone()).await.unwrap();
        settle().await;

        let first_reports = sink.reports_for(&first).await;
        assert_eq!(first_reports.len(), 2);
        assert_eq!(first_reports[1].position, 0.5);

        assert!(sink.reports_for(&second).await.is_empty());
        assert_eq!(tracker.active_article(), Some(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_flushes_and_goes_silent() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-1");

        tracker.start(article.clone()).await.unwrap();
        tracker.on_scroll(create_test_metrics(-2200.0));
        settle().await;
        advance(DEBOUNCE_WINDOW).await;
        settle().await;

        tracker.stop().await.unwrap();
        settle().await;
        assert!(!tracker.is_active());
        assert_eq!(tracker.active_article(), None);

        let flushed = sink.reports_for(&article).await;
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed[1].position, 1.0);

        // Nothing more after stop, no matter how long the clock runs
        tracker.on_scroll(create_test_metrics(-550.0));
        advance(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(sink.reports_for(&article).await.len(), 2);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_silent() {
        let (mut tracker, sink) = create_test_tracker();

        tracker.stop().await.unwrap();
        tracker.stop().await.unwrap();
        assert!(!tracker.is_active());
        assert!(sink.reports().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_failure_never_surfaces() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-1");
        sink.fail_delivery(true);

        tracker.start(article.clone()).await.unwrap();
        tracker.on_scroll(create_test_metrics(-1100.0));
        settle().await;
        advance(DEBOUNCE_WINDOW).await;
        settle().await;
        tracker.on_visibility_change(Visibility::Hidden);
        settle().await;
        tracker.stop().await.unwrap();
        settle().await;

        assert!(sink.reports().await.is_empty());

        // Recovery is simply the next delivery that succeeds
        sink.fail_delivery(false);
        tracker.start(article.clone()).await.unwrap();
        tracker.stop().await.unwrap();
        settle().await;
        assert_eq!(sink.reports_for(&article).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_while_idle_are_dropped() {
        let (tracker, sink) = create_test_tracker();

        tracker.on_scroll(create_test_metrics(-1100.0));
        tracker.on_visibility_change(Visibility::Hidden);
        settle().await;

        assert!(!tracker.is_active());
        assert!(sink.reports().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_and_flushes() {
        let (mut tracker, sink) = create_test_tracker();
        let article = create_test_article("art-1");
        tracker.start(article.clone()).await.unwrap();

        drop(tracker);
        settle().await;

        let reports = sink.reports_for(&article).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].position, 0.0);
    }
}
