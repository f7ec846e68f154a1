//! Reading-progress session engine for readtrace.
//!
//! This crate turns scroll and visibility observations into debounced,
//! periodic progress reports delivered through a pluggable sink.

#![warn(missing_docs)]

pub mod events;
pub mod session;
pub mod tracker;

mod worker;

pub use events::{PageEvent, ScrollMetrics, Visibility};
pub use session::TrackingSession;
pub use tracker::{ReadingTracker, Result, TrackerConfig, TrackerError};
