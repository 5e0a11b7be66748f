//! # Server Options
//!
//! Command-line flags for the operator process.

use crate::constants::{
    DEFAULT_SERVICE_VERSION, DEFAULT_THREADINESS, DEFAULT_TRACING_ENDPOINT,
    MONITORING_DISABLED_PORT,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// What happens to buffered spans when the run loop fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalExitPolicy {
    /// Exit without flushing; spans describing the failure may be lost
    Abandon,
    /// Shut down the tracer provider before the fatal return
    FlushFirst,
}

/// Operator process options
#[derive(Debug, Clone, Parser)]
#[command(name = "mpi-operator", version, about = "MPI operator controller")]
pub struct ServerOptions {
    /// Path to a kubeconfig. Only required if out-of-cluster
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// The address of the Kubernetes API server. Overrides any value in kubeconfig
    #[arg(long, env = "MASTER_URL")]
    pub master_url: Option<String>,

    /// The namespace the controller is scoped to. All namespaces when unset
    #[arg(long, env = "NAMESPACE")]
    pub namespace: Option<String>,

    /// How many worker threads the controller runs
    #[arg(
        long,
        env = "THREADINESS",
        default_value_t = DEFAULT_THREADINESS,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub threadiness: u16,

    /// Port serving Prometheus metrics on /metrics. 0 disables monitoring
    #[arg(long, env = "MONITORING_PORT", default_value_t = MONITORING_DISABLED_PORT)]
    pub monitoring_port: u16,

    /// OTLP gRPC collector receiving spans
    #[arg(long, env = "TRACING_ENDPOINT", default_value = DEFAULT_TRACING_ENDPOINT)]
    pub tracing_endpoint: String,

    /// Version reported in the `service.version` trace resource attribute
    #[arg(long, env = "SERVICE_VERSION", default_value = DEFAULT_SERVICE_VERSION)]
    pub service_version: String,

    /// Flush buffered spans before exiting on a run loop failure
    #[arg(long, env = "FLUSH_TRACES_ON_FATAL")]
    pub flush_traces_on_fatal: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl ServerOptions {
    /// Whether the metrics endpoint should be started
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring_port != MONITORING_DISABLED_PORT
    }

    /// Fatal-path handling of the tracer provider selected by the flags
    pub fn fatal_exit_policy(&self) -> FatalExitPolicy {
        if self.flush_traces_on_fatal {
            FatalExitPolicy::FlushFirst
        } else {
            FatalExitPolicy::Abandon
        }
    }
}
