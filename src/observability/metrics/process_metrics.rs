//! # Process Metrics
//!
//! Metrics describing the operator process itself: build information, tracing
//! availability, auxiliary startup failures and lifecycle transitions.

use crate::observability::metrics::registry::register_collector;
use anyhow::Result;
use prometheus::{IntCounterVec, IntGauge, IntGaugeVec};
use std::sync::LazyLock;

static BUILD_INFO: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "mpi_operator_build_info",
            "Build information of the running operator, value is always 1",
        ),
        &["version"],
    )
    .expect("Failed to create BUILD_INFO metric - this should never happen")
});

static TRACING_ENABLED: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "mpi_operator_tracing_enabled",
        "Whether the OpenTelemetry tracing pipeline is active (1) or degraded (0)",
    )
    .expect("Failed to create TRACING_ENABLED metric - this should never happen")
});

static STARTUP_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mpi_operator_startup_failures_total",
            "Total number of non-fatal failures of auxiliary components by component",
        ),
        &["component"],
    )
    .expect("Failed to create STARTUP_FAILURES_TOTAL metric - this should never happen")
});

static LIFECYCLE_TRANSITIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "mpi_operator_lifecycle_transitions_total",
            "Total number of process lifecycle transitions by target state",
        ),
        &["state"],
    )
    .expect("Failed to create LIFECYCLE_TRANSITIONS_TOTAL metric - this should never happen")
});

/// Register process metrics with the registry
pub(crate) fn register_process_metrics() -> Result<()> {
    register_collector(&*BUILD_INFO)?;
    register_collector(&*TRACING_ENABLED)?;
    register_collector(&*STARTUP_FAILURES_TOTAL)?;
    register_collector(&*LIFECYCLE_TRANSITIONS_TOTAL)?;
    Ok(())
}

pub fn set_build_info(version: &str) {
    BUILD_INFO.with_label_values(&[version]).set(1);
}

pub fn set_tracing_enabled(enabled: bool) {
    TRACING_ENABLED.set(i64::from(enabled));
}

pub fn increment_startup_failures(component: &str) {
    STARTUP_FAILURES_TOTAL.with_label_values(&[component]).inc();
}

pub fn increment_lifecycle_transitions(state: &str) {
    LIFECYCLE_TRANSITIONS_TOTAL.with_label_values(&[state]).inc();
}
