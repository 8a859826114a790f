//! gRPC server that hosts the API service.

use crate::interceptor::LoggingInterceptor;
use crate::proto::api::api_server::ApiServer;
use crate::record::RecordService;
use crate::record_backend::RecordBackend;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

/// gRPC server wrapper.
///
/// Hosts the API service behind the logging interceptor and manages the
/// server lifecycle.
pub struct GrpcServer {
    addr: SocketAddr,
    backend: Arc<dyn RecordBackend>,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    server_handle: Option<JoinHandle<Result<(), tonic::transport::Error>>>,
}

impl GrpcServer {
    /// Create a new gRPC server.
    ///
    /// # Arguments
    /// - `addr`: Socket address to bind to (port 0 picks a free port)
    /// - `backend`: RecordBackend the service reads from
    pub fn new(addr: SocketAddr, backend: Arc<dyn RecordBackend>) -> Self {
        Self {
            addr,
            backend,
            local_addr: None,
            shutdown_tx: None,
            server_handle: None,
        }
    }

    /// Start the gRPC server.
    ///
    /// Binds the listener, spawns a background task to run the server, and
    /// returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr, GrpcServerError> {
        tracing::info!("Starting gRPC server on {}", self.addr);

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| GrpcServerError::Bind(format!("{}: {}", self.addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GrpcServerError::Bind(e.to_string()))?;

        let service = LoggingInterceptor::new(RecordService::new(self.backend.clone()));

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let server = Server::builder()
            .add_service(ApiServer::new(service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                shutdown_rx.await.ok();
            });

        let handle = tokio::spawn(async move {
            tracing::info!("gRPC server task started");
            let result = server.await;
            tracing::info!("gRPC server task stopped");
            result
        });

        self.server_handle = Some(handle);
        self.local_addr = Some(local_addr);

        tracing::info!("gRPC server listening on {}", local_addr);
        Ok(local_addr)
    }

    /// Shutdown the gRPC server gracefully.
    ///
    /// Stops accepting new calls and waits up to `drain_timeout` for
    /// in-flight calls to finish. Calls still running after that are
    /// dropped.
    pub async fn shutdown(mut self, drain_timeout: Duration) -> Result<(), GrpcServerError> {
        tracing::info!("Shutting down gRPC server");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut handle) = self.server_handle.take() {
            match tokio::time::timeout(drain_timeout, &mut handle).await {
                Ok(joined) => {
                    joined
                        .map_err(|e| GrpcServerError::Shutdown(e.to_string()))?
                        .map_err(|e| GrpcServerError::Server(e.to_string()))?;
                }
                Err(_) => {
                    tracing::warn!(
                        "gRPC drain exceeded {:?}, aborting in-flight calls",
                        drain_timeout
                    );
                    handle.abort();
                    return Err(GrpcServerError::DrainTimeout(drain_timeout));
                }
            }
        }

        tracing::info!("gRPC server shutdown complete");
        Ok(())
    }

    /// Get the bound address, or the configured one before `start`.
    pub fn addr(&self) -> SocketAddr {
        self.local_addr.unwrap_or(self.addr)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrpcServerError {
    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),

    #[error("Drain did not finish within {0:?}")]
    DrainTimeout(Duration),
}
