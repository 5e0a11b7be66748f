//! # Observability
//!
//! Telemetry for the operator process.
//!
//! ## Sub-modules
//!
//! - `logging` - `tracing` subscriber setup
//! - `metrics` - Prometheus registry and process metrics
//! - `server` - Background HTTP server exposing `/metrics`
//! - `otel` - OpenTelemetry tracer provider construction and shutdown
//!
//! Telemetry is auxiliary: failures here are logged and never stop the controller.

pub mod logging;
pub mod metrics;
pub mod otel;
pub mod server;
