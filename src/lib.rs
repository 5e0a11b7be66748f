//! MPI Operator Library
//!
//! Startup and shutdown orchestration for the MPI operator controller process:
//! configuration, the Prometheus metrics endpoint, the OpenTelemetry tracing
//! pipeline and the controller run loop.
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod observability;
pub mod runtime;

pub use config::ServerOptions;
pub use runtime::orchestrator::{LifecycleState, Orchestrator, OrchestratorError, RunContext, RunLoop};
