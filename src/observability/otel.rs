//! # OpenTelemetry Support
//!
//! Builds the tracing pipeline of the operator:
//! - OTLP span exporter over gRPC (tonic) with plaintext transport
//! - Resource tagging every span with `service.name` and `service.version`
//! - Batch span processor
//! - Always-on sampler (every span is recorded)
//!
//! The pipeline is returned as an owned [`TracerProviderHandle`] rather than
//! installed as the global default. Code that emits spans receives the handle
//! explicitly, and the owner releases it exactly once with
//! [`TracerProviderHandle::shutdown`].
//!
//! Always-on sampling with batched export trades throughput for complete traces,
//! which suits a low-QPS control plane process.

use crate::constants::SERVICE_NAME;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{ExporterBuildError, SpanExporter as OtlpSpanExporter, WithExportConfig};
use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider, SpanExporter};
use opentelemetry_sdk::Resource;
use std::borrow::Cow;
use thiserror::Error;
use tracing::info;

/// Resource attribute key for the service version
pub const SERVICE_VERSION_KEY: &str = "service.version";

/// Errors raised while building or releasing the tracing pipeline
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("tracing endpoint is empty")]
    EmptyEndpoint,

    #[error("failed to build OTLP span exporter for {endpoint}: {reason}")]
    Exporter {
        endpoint: String,
        reason: ExporterBuildError,
    },

    #[error("failed to flush tracer provider: {0}")]
    Flush(OTelSdkError),

    #[error("failed to shut down tracer provider: {0}")]
    Shutdown(OTelSdkError),
}

/// Normalize a collector endpoint into a URI tonic accepts
///
/// A bare `host:port` gets an `http://` scheme, since the exporter never uses TLS.
///
/// # Errors
///
/// Returns [`TracingError::EmptyEndpoint`] for an empty or blank endpoint.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, TracingError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(TracingError::EmptyEndpoint);
    }
    if endpoint.contains("://") {
        Ok(endpoint.to_owned())
    } else {
        Ok(format!("http://{endpoint}"))
    }
}

/// Resource describing this service on every exported span
pub fn service_resource(service_version: &str) -> Resource {
    Resource::builder_empty()
        .with_service_name(SERVICE_NAME)
        .with_attribute(KeyValue::new(SERVICE_VERSION_KEY, service_version.to_owned()))
        .build()
}

/// Builds tracer providers for a given service version
#[derive(Debug, Clone)]
pub struct TraceProviderFactory {
    service_version: String,
}

impl TraceProviderFactory {
    pub fn new(service_version: impl Into<String>) -> Self {
        Self {
            service_version: service_version.into(),
        }
    }

    /// Build an OTLP/gRPC pipeline targeting `endpoint`
    ///
    /// The gRPC channel connects lazily, so an unreachable collector only shows
    /// up as export errors later. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is empty or the exporter cannot be built
    /// (e.g. a malformed URI). Nothing is created in that case.
    pub fn setup(&self, endpoint: &str) -> Result<TracerProviderHandle, TracingError> {
        let endpoint = normalize_endpoint(endpoint)?;
        let exporter = OtlpSpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.clone())
            .build()
            .map_err(|reason| TracingError::Exporter {
                endpoint: endpoint.clone(),
                reason,
            })?;

        info!(
            "OpenTelemetry OTLP configured: endpoint={}, service={}, version={}",
            endpoint, SERVICE_NAME, self.service_version
        );
        Ok(self.install(exporter))
    }

    /// Build the pipeline around an already constructed exporter
    pub fn install<E>(&self, exporter: E) -> TracerProviderHandle
    where
        E: SpanExporter + 'static,
    {
        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(service_resource(&self.service_version))
            .with_sampler(Sampler::AlwaysOn)
            .build();
        TracerProviderHandle { provider }
    }
}

/// Owned handle to the installed tracing pipeline
///
/// Not `Clone`: the single owner decides when buffered spans are flushed.
#[derive(Debug)]
pub struct TracerProviderHandle {
    provider: SdkTracerProvider,
}

impl TracerProviderHandle {
    /// Tracer for the given instrumentation scope
    pub fn tracer(&self, name: impl Into<Cow<'static, str>>) -> SdkTracer {
        self.provider.tracer(name)
    }

    /// Export all buffered spans without releasing the pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if the span processor fails to flush.
    pub fn force_flush(&self) -> Result<(), TracingError> {
        self.provider.force_flush().map_err(TracingError::Flush)
    }

    /// Flush buffered spans and release the pipeline
    ///
    /// Blocks until the batch processor has exported its queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the processor or exporter fails to shut down.
    pub fn shutdown(self) -> Result<(), TracingError> {
        self.provider.shutdown().map_err(TracingError::Shutdown)
    }

    /// Give up the pipeline without flushing, for the fatal exit path
    ///
    /// The provider is leaked so that its `Drop` does not flush either;
    /// the process is about to exit.
    pub fn abandon(self) {
        std::mem::forget(self.provider);
    }
}
