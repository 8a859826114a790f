//! HTTP front door.
//!
//! Serves the health probe and the JSON gateway onto the RPC service on one
//! listener.

use crate::health::{healthz_handler, ShutdownState};
use axum::{routing::get, Router};
use kifulog_transport_grpc::bridge::PathBridgeLayer;
use kifulog_transport_grpc::Gateway;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Build the front door router.
///
/// Provides:
/// - GET /healthz - 200 while serving, 503 once shutdown has started
/// - GET /api/... - JSON gateway onto the RPC service
///
/// The gateway routes sit behind [`PathBridgeLayer`] so each forwarded call
/// carries the full `/api/...` path. The probe is not bridged.
pub fn router(gateway: Gateway, shutdown_state: ShutdownState) -> Router {
    let health = Router::new()
        .route("/healthz", get(healthz_handler))
        .with_state(shutdown_state);

    health.merge(gateway.router().layer(PathBridgeLayer::new()))
}

/// HTTP server for the front door.
pub struct HttpServer {
    addr: SocketAddr,
    gateway: Gateway,
    shutdown_state: ShutdownState,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    server_handle: Option<JoinHandle<Result<(), std::io::Error>>>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, gateway: Gateway, shutdown_state: ShutdownState) -> Self {
        Self {
            addr,
            gateway,
            shutdown_state,
            local_addr: None,
            shutdown_tx: None,
            server_handle: None,
        }
    }

    /// Start the HTTP server and return the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr, HttpServerError> {
        tracing::info!("Starting HTTP server on {}", self.addr);

        let app = router(self.gateway.clone(), self.shutdown_state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| HttpServerError::Startup(format!("Failed to bind {}: {}", self.addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| HttpServerError::Startup(e.to_string()))?;

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await
        });

        self.server_handle = Some(server_handle);
        self.local_addr = Some(local_addr);

        tracing::info!("HTTP server listening on {}", local_addr);
        Ok(local_addr)
    }

    /// Shutdown the HTTP server gracefully.
    ///
    /// Stops accepting connections and waits up to `drain_timeout` for open
    /// requests to complete before dropping them.
    pub async fn shutdown(mut self, drain_timeout: Duration) -> Result<(), HttpServerError> {
        tracing::info!("Shutting down HTTP server");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut handle) = self.server_handle.take() {
            match tokio::time::timeout(drain_timeout, &mut handle).await {
                Ok(joined) => {
                    joined
                        .map_err(|e| HttpServerError::Shutdown(format!("Join error: {}", e)))?
                        .map_err(|e| HttpServerError::Shutdown(format!("Server error: {}", e)))?;
                }
                Err(_) => {
                    tracing::warn!("HTTP drain exceeded {:?}, aborting", drain_timeout);
                    handle.abort();
                    return Err(HttpServerError::DrainTimeout(drain_timeout));
                }
            }
        }

        tracing::info!("HTTP server shutdown complete");
        Ok(())
    }

    /// Get the bound address, or the configured one before `start`.
    pub fn addr(&self) -> SocketAddr {
        self.local_addr.unwrap_or(self.addr)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),

    #[error("Drain did not finish within {0:?}")]
    DrainTimeout(Duration),
}
