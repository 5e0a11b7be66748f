//! # Tracing Pipeline Tests
//!
//! Exercise the tracer provider built by `TraceProviderFactory` against a
//! recording exporter: sampling, resource tagging, batching and the two ways
//! of releasing the pipeline.

mod common;

use common::RecordingExporter;
use mpi_operator::constants::SERVICE_NAME;
use mpi_operator::observability::otel::{TraceProviderFactory, TracerProviderHandle, SERVICE_VERSION_KEY};
use opentelemetry::trace::{Span as _, Tracer as _};
use opentelemetry::{Key, Value};

fn record_span(handle: &TracerProviderHandle, name: &'static str) {
    handle.tracer("test").in_span(name, |_cx| {});
}

#[test]
fn test_every_span_is_sampled() {
    let exporter = RecordingExporter::default();
    let handle = TraceProviderFactory::new("0.0.1").install(exporter.clone());
    let tracer = handle.tracer("test");

    for i in 0..25 {
        let mut span = tracer.start(format!("span-{i}"));
        span.end();
    }
    handle.force_flush().unwrap();

    let spans = exporter.spans();
    assert_eq!(spans.len(), 25);
    assert!(spans.iter().all(|span| span.span_context.is_sampled()));
    handle.shutdown().unwrap();
}

#[test]
fn test_exporter_receives_service_resource() {
    let exporter = RecordingExporter::default();
    let handle = TraceProviderFactory::new("2.4.0").install(exporter.clone());
    record_span(&handle, "resource");
    handle.shutdown().unwrap();

    let resource = exporter.resource().expect("resource handed to exporter");
    assert_eq!(
        resource.get(&Key::from_static_str("service.name")),
        Some(Value::from(SERVICE_NAME))
    );
    assert_eq!(
        resource.get(&Key::from_static_str(SERVICE_VERSION_KEY)),
        Some(Value::from("2.4.0"))
    );
}

#[test]
fn test_spans_are_buffered_until_shutdown() {
    let exporter = RecordingExporter::default();
    let handle = TraceProviderFactory::new("0.0.1").install(exporter.clone());
    record_span(&handle, "buffered");

    // Default batch delay is several seconds; nothing is exported yet.
    assert!(exporter.spans().is_empty());

    handle.shutdown().unwrap();
    let spans = exporter.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "buffered");
}

#[test]
fn test_abandon_does_not_flush() {
    let exporter = RecordingExporter::default();
    let handle = TraceProviderFactory::new("0.0.1").install(exporter.clone());
    record_span(&handle, "lost");

    handle.abandon();
    assert!(exporter.spans().is_empty());
}
