//! Page observations fed into the engine.
//!
//! Hosts sample these from whatever surface renders the content and
//! push them in through the tracker. No document environment is ever
//! touched here, so synthetic events can drive the engine in tests.

use serde::{Deserialize, Serialize};

/// Pixel geometry of the tracked content, sampled at scroll time.
///
/// `content_top` is the offset of the content's top edge from the top
/// of the viewport; it goes negative as the reader scrolls into the
/// content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Top edge of the content relative to the viewport top, in pixels
    pub content_top: f64,
    /// Full height of the content, in pixels
    pub content_height: f64,
    /// Height of the viewport, in pixels
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Normalized reading position in `[0.0, 1.0]`.
    ///
    /// The fraction of the scrollable range that has passed the top of
    /// the viewport. Content exactly as tall as the viewport has no
    /// scrollable range; its position snaps to 1.0 once any of it has
    /// scrolled past the top, else 0.0. Content strictly shorter than
    /// the viewport reads as 0.0, and non-finite geometry reads as 0.0
    /// so a bad sample never escapes the position invariant.
    pub fn position(&self) -> f64 {
        if !self.content_top.is_finite()
            || !self.content_height.is_finite()
            || !self.viewport_height.is_finite()
        {
            return 0.0;
        }

        let scrolled = (-self.content_top).max(0.0);
        let scrollable = self.content_height - self.viewport_height;

        if scrollable < 0.0 {
            return 0.0;
        }
        if scrollable == 0.0 {
            return if scrolled > 0.0 { 1.0 } else { 0.0 };
        }

        (scrolled / scrollable).clamp(0.0, 1.0)
    }
}

/// Whether the surface hosting the reader is currently visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// The surface is in the foreground
    Visible,
    /// The surface is backgrounded or minimized
    Hidden,
}

/// One observation pushed into the engine by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PageEvent {
    /// The reader scrolled; carries the sampled content geometry
    Scrolled(ScrollMetrics),
    /// The surface visibility changed
    VisibilityChanged(Visibility),
}
