//! Progress report payloads.

use serde::{Deserialize, Serialize};

/// A reading-progress measurement.
///
/// `position` is the normalized scroll fraction through the content and
/// `duration` the whole seconds of active reading since the current
/// reading span began. Serializes to the exact body the progress
/// endpoint expects: `{"position": <float>, "duration": <integer>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Normalized reading position in `[0.0, 1.0]`
    pub position: f64,
    /// Active reading duration in whole seconds
    pub duration: u64,
}

impl ProgressReport {
    /// Create a report, clamping `position` into `[0.0, 1.0]`.
    pub fn new(position: f64, duration: u64) -> Self {
        Self {
            position: position.clamp(0.0, 1.0),
            duration,
        }
    }

    /// The zero-valued report recorded when an item is first opened.
    pub fn opened() -> Self {
        Self {
            position: 0.0,
            duration: 0,
        }
    }
}
