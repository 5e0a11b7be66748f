//! # Metrics Module
//!
//! Prometheus metrics for monitoring the operator process, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - Metrics registry setup, registration and text encoding
//! - `process_metrics` - Startup and lifecycle metrics (build info, tracing state, failures)

pub mod process_metrics;
pub mod registry;

pub use process_metrics::*;
pub use registry::*;
