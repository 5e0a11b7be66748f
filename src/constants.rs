//! # Constants
//!
//! Names, defaults and fixed values shared across the operator process.

/// Service name attached to every exported span (`service.name` resource attribute)
pub const SERVICE_NAME: &str = "mpi-operator";

/// Instrumentation scope name used for tracers handed to the run loop
pub const TRACER_NAME: &str = "github.com/kubeflow/mpi-operator";

/// Default OTLP gRPC collector endpoint
pub const DEFAULT_TRACING_ENDPOINT: &str = "http://tempo.tempo:4317";

/// Default service version reported in trace resources
pub const DEFAULT_SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Monitoring port value that disables the metrics endpoint
pub const MONITORING_DISABLED_PORT: u16 = 0;

/// HTTP path serving the Prometheus exposition
pub const METRICS_PATH: &str = "/metrics";

/// Default number of controller workers
pub const DEFAULT_THREADINESS: u16 = 2;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "mpi_operator=info";
