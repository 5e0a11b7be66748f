//! # Controller Run Loop
//!
//! Default run loop of the operator binary. It connects to the Kubernetes API
//! server, records a startup span when tracing is available, and then waits
//! for SIGINT or SIGTERM. Reconciliation is not part of this crate.

use crate::config::ServerOptions;
use crate::constants::TRACER_NAME;
use crate::runtime::orchestrator::{RunContext, RunLoop};
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::Uri;
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use kube::Client;
use opentelemetry::trace::{Span as _, Tracer as _};
use opentelemetry::KeyValue;
use tracing::info;

/// Run loop connecting to the cluster and blocking until a termination signal
#[derive(Debug, Default)]
pub struct ControllerRunLoop;

impl ControllerRunLoop {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RunLoop for ControllerRunLoop {
    async fn run(&mut self, ctx: RunContext<'_>) -> Result<()> {
        let options = ctx.options;
        let client = build_client(options)
            .await
            .context("failed to build Kubernetes client")?;
        let version = client
            .apiserver_version()
            .await
            .context("failed to reach Kubernetes API server")?;

        let namespace = options.namespace.as_deref().unwrap_or("*");
        info!(
            "Connected to Kubernetes API server {} (namespace={}, threadiness={})",
            version.git_version, namespace, options.threadiness
        );

        if let Some(provider) = ctx.tracer_provider {
            let mut span = provider.tracer(TRACER_NAME).start("controller.startup");
            span.set_attribute(KeyValue::new(
                "k8s.apiserver.version",
                version.git_version.clone(),
            ));
            span.set_attribute(KeyValue::new("k8s.namespace.name", namespace.to_owned()));
            span.set_attribute(KeyValue::new(
                "controller.threadiness",
                i64::from(options.threadiness),
            ));
            span.end();
        }

        shutdown_signal().await?;
        info!("Termination signal received, stopping controller");
        Ok(())
    }
}

/// Build a Kubernetes client from the kubeconfig flag or the inferred environment
///
/// # Errors
///
/// Returns an error if no usable configuration can be loaded or the master URL is invalid.
pub async fn build_client(options: &ServerOptions) -> Result<Client> {
    let mut config = match &options.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
        None => Config::infer().await?,
    };

    if let Some(master_url) = &options.master_url {
        config.cluster_url = master_url
            .parse::<Uri>()
            .with_context(|| format!("invalid master URL {master_url}"))?;
    }
    if let Some(namespace) = &options.namespace {
        config.default_namespace.clone_from(namespace);
    }

    Ok(Client::try_from(config)?)
}

/// Wait for SIGINT or, on unix, SIGTERM
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_missing_kubeconfig_is_an_error() {
        let options = ServerOptions::parse_from([
            "mpi-operator",
            "--kubeconfig",
            "/nonexistent/mpi-operator/kubeconfig",
        ]);
        let Err(err) = build_client(&options).await else {
            panic!("client built without a kubeconfig");
        };
        assert!(
            err.to_string().contains("failed to read kubeconfig"),
            "{err:#}"
        );
    }

    #[tokio::test]
    async fn test_run_loop_fails_without_cluster() {
        let options = ServerOptions::parse_from([
            "mpi-operator",
            "--kubeconfig",
            "/nonexistent/mpi-operator/kubeconfig",
        ]);
        let result = ControllerRunLoop::new()
            .run(RunContext {
                options: &options,
                tracer_provider: None,
            })
            .await;
        assert!(result.is_err());
    }
}
