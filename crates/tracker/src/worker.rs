//! Session worker loop.

use std::sync::Arc;

use readtrace_sink::ProgressSink;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::{PageEvent, ScrollMetrics, Visibility};
use crate::session::TrackingSession;
use crate::tracker::TrackerConfig;

/// Drive one session until cancelled.
///
/// Owns the session state. Scroll bursts settle through a trailing-edge
/// debounce while a periodic ticker syncs progress unconditionally.
/// Hiding the surface flushes immediately and regaining it restarts the
/// reading span. Cancellation emits one final report before exit.
pub(crate) async fn session_loop(
    mut session: TrackingSession,
    started: Instant,
    sink: Arc<dyn ProgressSink>,
    config: TrackerConfig,
    mut events: mpsc::UnboundedReceiver<PageEvent>,
    cancel: CancellationToken,
) {
    // Anchored at start(), not at first poll, so the first tick lands
    // exactly one interval into the session
    let mut ticker = interval_at(started + config.sync_interval, config.sync_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Re-armed on every scroll; the arm stays disabled until one is pending
    let debounce = sleep(config.debounce_window);
    tokio::pin!(debounce);
    let mut pending_scroll: Option<ScrollMetrics> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                spawn_report(&sink, &session);
            }
            Some(event) = events.recv() => {
                match event {
                    PageEvent::Scrolled(metrics) => {
                        pending_scroll = Some(metrics);
                        debounce.as_mut().reset(Instant::now() + config.debounce_window);
                    }
                    PageEvent::VisibilityChanged(Visibility::Hidden) => {
                        // Flush before the surface goes to the background
                        spawn_report(&sink, &session);
                    }
                    PageEvent::VisibilityChanged(Visibility::Visible) => {
                        // Time spent hidden does not count as reading
                        session.restart_span();
                    }
                }
            }
            _ = &mut debounce, if pending_scroll.is_some() => {
                if let Some(metrics) = pending_scroll.take() {
                    if session.record_position(metrics.position()) {
                        spawn_report(&sink, &session);
                    }
                }
            }
            _ = cancel.cancelled() => {
                spawn_report(&sink, &session);
                debug!("Session {} worker shutting down", session.id);
                break;
            }
        }
    }
}

/// Deliver the session's current report without blocking the loop.
///
/// Failures are logged and dropped. Recovery is whatever report the
/// session emits next.
fn spawn_report(sink: &Arc<dyn ProgressSink>, session: &TrackingSession) {
    let report = session.report();
    let sink = Arc::clone(sink);
    let article = session.article.clone();
    let session_id = session.id;

    tokio::spawn(async move {
        if let Err(e) = sink.record_progress(&article, report).await {
            warn!(
                "Progress report failed for {} (session {}): {}",
                article, session_id, e
            );
        }
    });
}
