//! # Orchestrator
//!
//! Top-level startup and shutdown sequence of the operator process:
//!
//! 1. Register metrics and launch the monitoring endpoint (fire-and-forget)
//! 2. Build the tracing pipeline (failure degrades to running without tracing)
//! 3. Run the controller run loop, blocking until it returns
//! 4. On success, shut down the tracer provider, flushing buffered spans
//!
//! Only a run loop failure is fatal. On that path the tracer provider is, by
//! default, abandoned without a flush (see [`FatalExitPolicy`]).

use crate::config::{FatalExitPolicy, ServerOptions};
use crate::observability::metrics;
use crate::observability::otel::{TraceProviderFactory, TracerProviderHandle, TracingError};
use crate::observability::server::{start_monitoring, MonitoringHandle};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};

/// Process lifecycle states, in the order the orchestrator can pass through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    MonitoringStarted,
    TracingReady,
    /// Tracing setup failed; the process runs without tracing
    TracingDegraded,
    Running,
    ShuttingDown,
    Exited,
    FatalExit,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::MonitoringStarted => "monitoring_started",
            Self::TracingReady => "tracing_ready",
            Self::TracingDegraded => "tracing_degraded",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Exited => "exited",
            Self::FatalExit => "fatal_exit",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`Orchestrator::run`]
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("controller run loop failed: {0:#}")]
    RunLoop(anyhow::Error),

    #[error("orchestrator has already run")]
    AlreadyRun,
}

/// Everything the run loop receives from the orchestrator
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub options: &'a ServerOptions,
    /// `None` when tracing setup failed
    pub tracer_provider: Option<&'a TracerProviderHandle>,
}

/// The controller logic invoked once by the orchestrator
#[async_trait]
pub trait RunLoop: Send {
    /// Run until the controller stops. An error is fatal for the process.
    async fn run(&mut self, ctx: RunContext<'_>) -> anyhow::Result<()>;
}

type TracingSetup = Box<dyn FnOnce() -> Result<TracerProviderHandle, TracingError> + Send>;

/// Sequences startup, the run loop and shutdown; runs once per process
pub struct Orchestrator {
    options: ServerOptions,
    tracing_setup: Option<TracingSetup>,
    monitoring: Option<MonitoringHandle>,
    transitions: Vec<LifecycleState>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .field("monitoring", &self.monitoring)
            .field("transitions", &self.transitions)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Orchestrator exporting spans over OTLP to `options.tracing_endpoint`
    pub fn new(options: ServerOptions) -> Self {
        let endpoint = options.tracing_endpoint.clone();
        let factory = TraceProviderFactory::new(options.service_version.clone());
        Self {
            options,
            tracing_setup: Some(Box::new(move || factory.setup(&endpoint))),
            monitoring: None,
            transitions: Vec::new(),
        }
    }

    /// Replace how the tracing pipeline is built
    #[must_use]
    pub fn with_tracing_setup<F>(mut self, setup: F) -> Self
    where
        F: FnOnce() -> Result<TracerProviderHandle, TracingError> + Send + 'static,
    {
        self.tracing_setup = Some(Box::new(setup));
        self
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Handle of the metrics server, if monitoring was started
    pub fn monitoring(&self) -> Option<&MonitoringHandle> {
        self.monitoring.as_ref()
    }

    /// Lifecycle states entered so far, in order
    pub fn transitions(&self) -> &[LifecycleState] {
        &self.transitions
    }

    /// Run the full startup, run loop and shutdown sequence
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::RunLoop`] if the run loop fails. The caller
    /// is expected to exit the process with a non-zero status. Returns
    /// [`OrchestratorError::AlreadyRun`] without side effects on a second call.
    pub async fn run<R>(&mut self, run_loop: &mut R) -> Result<(), OrchestratorError>
    where
        R: RunLoop + ?Sized,
    {
        if !self.transitions.is_empty() {
            return Err(OrchestratorError::AlreadyRun);
        }
        self.transition(LifecycleState::Starting);

        if let Err(e) = metrics::register_metrics() {
            warn!(error = %e, "metrics.registration.failure");
        }
        metrics::set_build_info(&self.options.service_version);

        self.monitoring = start_monitoring(self.options.monitoring_port);
        if self.monitoring.is_some() {
            self.transition(LifecycleState::MonitoringStarted);
        }

        let tracer_provider = self.setup_tracing();

        self.transition(LifecycleState::Running);
        let result = run_loop
            .run(RunContext {
                options: &self.options,
                tracer_provider: tracer_provider.as_ref(),
            })
            .await;

        match result {
            Ok(()) => {
                self.transition(LifecycleState::ShuttingDown);
                if let Some(provider) = tracer_provider {
                    shutdown_tracing(provider).await;
                }
                self.transition(LifecycleState::Exited);
                Ok(())
            }
            Err(e) => {
                error!("Controller run loop failed: {:#}", e);
                if let Some(provider) = tracer_provider {
                    match self.options.fatal_exit_policy() {
                        FatalExitPolicy::Abandon => provider.abandon(),
                        FatalExitPolicy::FlushFirst => {
                            self.transition(LifecycleState::ShuttingDown);
                            shutdown_tracing(provider).await;
                        }
                    }
                }
                self.transition(LifecycleState::FatalExit);
                Err(OrchestratorError::RunLoop(e))
            }
        }
    }

    fn setup_tracing(&mut self) -> Option<TracerProviderHandle> {
        let setup = self.tracing_setup.take()?;
        match setup() {
            Ok(provider) => {
                metrics::set_tracing_enabled(true);
                self.transition(LifecycleState::TracingReady);
                Some(provider)
            }
            Err(e) => {
                error!(error = %e, "tracing.setup.failure");
                metrics::set_tracing_enabled(false);
                metrics::increment_startup_failures("tracing");
                self.transition(LifecycleState::TracingDegraded);
                None
            }
        }
    }

    fn transition(&mut self, state: LifecycleState) {
        info!(state = %state, "lifecycle.transition");
        metrics::increment_lifecycle_transitions(state.as_str());
        self.transitions.push(state);
    }
}

/// Shut down the tracer provider on the blocking pool
///
/// The batch processor blocks while exporting; the tonic channel it exports
/// through still needs the runtime to make progress.
async fn shutdown_tracing(provider: TracerProviderHandle) {
    match tokio::task::spawn_blocking(move || provider.shutdown()).await {
        Ok(Ok(())) => info!("Tracer provider shut down, buffered spans flushed"),
        Ok(Err(e)) => warn!(error = %e, "tracing.shutdown.failure"),
        Err(e) => warn!(error = %e, "tracing.shutdown.task_failure"),
    }
}
