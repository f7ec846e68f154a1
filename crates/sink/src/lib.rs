//! Delivery abstraction and implementations for readtrace.
//!
//! This crate provides a trait-based sink interface with an HTTP
//! reference implementation and an in-memory backend for tests.

#![warn(missing_docs)]

pub mod trait_;
pub mod http;
pub mod memory;

pub use trait_::{ProgressSink, SinkError, Result};
pub use http::HttpProgressSink;
pub use memory::{MemoryProgressSink, RecordedReport};
