//! # Monitoring Server
//!
//! Background HTTP server exposing Prometheus metrics on `/metrics`.
//!
//! The server is launched fire-and-forget: [`start_monitoring`] returns before
//! the socket is bound, and a bind or serve failure is logged inside the task
//! and never reaches the caller. Telemetry must not block or crash the
//! controller.

use crate::constants::{METRICS_PATH, MONITORING_DISABLED_PORT};
use crate::observability::metrics;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Errors ending the monitoring server task
#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("failed to bind monitoring endpoint on port {port}: {reason}")]
    Bind { port: u16, reason: std::io::Error },

    #[error("monitoring endpoint stopped serving: {0}")]
    Serve(std::io::Error),
}

/// Handle to the background metrics server task
///
/// The orchestrator keeps it but never joins or cancels it; the task lives as
/// long as the process.
#[derive(Debug)]
pub struct MonitoringHandle {
    port: u16,
    task: JoinHandle<()>,
}

impl MonitoringHandle {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the server task has ended (only happens on failure)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the server task
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Router serving the metrics exposition
pub fn router() -> Router {
    Router::new().route(METRICS_PATH, get(metrics_handler))
}

async fn metrics_handler() -> Response {
    match metrics::gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics::exposition_content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics.encode.failure");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Start the metrics endpoint on `port` in the background
///
/// Returns `None` without creating a socket when `port` is 0. Otherwise spawns
/// the server and returns immediately. Must be called from within a tokio runtime.
pub fn start_monitoring(port: u16) -> Option<MonitoringHandle> {
    if port == MONITORING_DISABLED_PORT {
        info!("Monitoring port is 0, metrics endpoint disabled");
        return None;
    }

    let task = tokio::spawn(async move {
        info!("Setting up client for monitoring on port: {}", port);
        if let Err(e) = serve_metrics(port).await {
            metrics::increment_startup_failures("monitoring");
            error!(port, error = %e, "monitoring.endpoint.failure");
        }
    });

    Some(MonitoringHandle { port, task })
}

/// Bind every interface on `port`
///
/// Tries the IPv6 wildcard first, which also accepts IPv4 on dual-stack hosts,
/// and falls back to the IPv4 wildcard where IPv6 is unavailable.
///
/// # Errors
///
/// Returns [`MonitoringError::Bind`] if neither address can be bound.
pub async fn bind_listener(port: u16) -> Result<TcpListener, MonitoringError> {
    match TcpListener::bind(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port))).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            debug!(port, error = %e, "monitoring.bind.ipv6_unavailable");
            TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
                .await
                .map_err(|reason| MonitoringError::Bind { port, reason })
        }
    }
}

async fn serve_metrics(port: u16) -> Result<(), MonitoringError> {
    let listener = bind_listener(port).await?;
    let addr = listener.local_addr().map_err(MonitoringError::Serve)?;
    info!("Metrics endpoint listening on {}{}", addr, METRICS_PATH);

    axum::serve(listener, router())
        .await
        .map_err(MonitoringError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_route_serves_exposition() {
        metrics::register_metrics().unwrap();
        metrics::set_build_info("route-test");

        let request = Request::builder()
            .method("GET")
            .uri(METRICS_PATH)
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("text/plain"), "{content_type}");

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("mpi_operator_build_info"), "{text}");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_port_zero_disables_monitoring() {
        assert!(start_monitoring(0).is_none());
    }

    #[tokio::test]
    async fn test_bind_listener_uses_wildcard_address() {
        let listener = bind_listener(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_unspecified(), "{addr}");
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_listener_accepts_ipv4_clients() {
        let listener = bind_listener(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::net::TcpStream::connect((Ipv4Addr::LOCALHOST, port))
            .await
            .expect("IPv4 client connects to the wildcard listener");
    }

    #[tokio::test]
    async fn test_bind_listener_reports_occupied_port() {
        let occupied = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();
        let result = bind_listener(port).await;
        assert!(matches!(result, Err(MonitoringError::Bind { port: p, .. }) if p == port));
    }

    #[tokio::test]
    async fn test_bind_failure_ends_task_quietly() {
        let occupied = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let handle = start_monitoring(port).expect("nonzero port starts a task");
        assert_eq!(handle.port(), port);

        for _ in 0..100 {
            if handle.is_finished() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(handle.is_finished());
    }
}
