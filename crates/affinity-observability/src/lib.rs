//! # affinity-observability
//!
//! Tracing subscriber setup and the span macros used on the aggregation,
//! persistence, and query paths.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, init_tracing_with_filter, LOG_ENV};
