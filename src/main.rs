//! # MPI Operator
//!
//! Entry point of the MPI operator controller process.
//!
//! ## Startup
//!
//! 1. **Configuration** - Parses command-line flags (exits with a diagnostic on error)
//! 2. **Logging** - Installs the `tracing` subscriber
//! 3. **Monitoring** - Serves Prometheus metrics on `/metrics` when `--monitoring-port` is set
//! 4. **Tracing** - Exports spans over OTLP/gRPC; failure is logged and the process continues
//! 5. **Run loop** - Runs the controller until it stops; a failure exits non-zero
//! 6. **Shutdown** - Flushes buffered spans before a normal exit

use anyhow::Result;
use clap::Parser;
use mpi_operator::config::ServerOptions;
use mpi_operator::observability::logging::init_logging;
use mpi_operator::runtime::{ControllerRunLoop, Orchestrator};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let options = ServerOptions::parse();

    if let Err(e) = init_logging(options.log_format) {
        eprintln!("{e}");
    }

    // Configure rustls crypto provider before the Kubernetes client is built
    // Required for rustls 0.23+ when no default provider is set via features
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    info!("Starting MPI operator v{}", env!("CARGO_PKG_VERSION"));

    let mut orchestrator = Orchestrator::new(options);
    orchestrator.run(&mut ControllerRunLoop::new()).await?;

    info!("MPI operator stopped");
    Ok(())
}
