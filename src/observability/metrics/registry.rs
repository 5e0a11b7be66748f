//! # Metrics Registry
//!
//! Prometheus metrics registry setup and registration.

use anyhow::Result;
use prometheus::core::Collector;
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::LazyLock;

/// Process-wide Prometheus metrics registry
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Register a single collector, treating an earlier registration as success
pub(crate) fn register_collector<C>(collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    match REGISTRY.register(Box::new(collector.clone())) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Register all metrics with the Prometheus registry
///
/// Safe to call more than once. Prometheus metrics internally use `Arc`,
/// so the clones handed to the registry share state with the statics.
///
/// # Errors
///
/// Returns an error if a metric descriptor conflicts with one already registered.
pub fn register_metrics() -> Result<()> {
    super::process_metrics::register_process_metrics()
}

/// Content type of the text exposition format
pub fn exposition_content_type() -> String {
    TextEncoder::new().format_type().to_owned()
}

/// Encode every registered metric in the Prometheus text exposition format
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_is_idempotent() {
        register_metrics().expect("first registration");
        register_metrics().expect("second registration");
    }

    #[test]
    fn test_gather_text_contains_registered_metrics() {
        register_metrics().expect("registration");
        super::super::process_metrics::set_build_info("9.9.9");
        let text = gather_text().expect("encoding");
        assert!(text.contains("mpi_operator_build_info"), "{text}");
    }

    #[test]
    fn test_exposition_content_type() {
        assert!(exposition_content_type().starts_with("text/plain"));
    }
}
