//! Server node composition.
//!
//! Wires the store, the gRPC server and the HTTP front door together and
//! owns their lifecycle.

use crate::config::ServerConfig;
use crate::health::ShutdownState;
use crate::http::HttpServer;
use kifulog_store::{Collection, Store, StoreError};
use kifulog_transport_grpc::{Gateway, GrpcServer, StoreBackend};
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

/// Server node - main composition root.
pub struct Node {
    /// Node configuration
    config: ServerConfig,

    /// Records loaded at startup, read-only afterwards
    store: Arc<Store>,

    /// Flag flipped when shutdown begins
    shutdown_state: ShutdownState,

    /// gRPC server (created on start)
    grpc_server: Option<GrpcServer>,

    /// HTTP front door (created on start)
    http_server: Option<HttpServer>,
}

impl Node {
    /// Create a new node from configuration.
    ///
    /// Loads every collection from `data_dir`. Any load failure is fatal.
    pub async fn new(config: ServerConfig) -> Result<Self, NodeError> {
        tracing::info!("Initializing node");
        tracing::info!("Data directory: {}", config.data_dir.display());

        let data_dir = config.data_dir.clone();
        let store = tokio::task::spawn_blocking(move || Store::load(data_dir))
            .await
            .map_err(|e| NodeError::Initialization(format!("Store load task failed: {}", e)))??;

        for collection in Collection::ALL {
            tracing::debug!(%collection, records = store.len(collection), "Collection ready");
        }

        Ok(Self {
            config,
            store: Arc::new(store),
            shutdown_state: ShutdownState::new(),
            grpc_server: None,
            http_server: None,
        })
    }

    /// Start the node.
    ///
    /// Starts the gRPC server first, then the HTTP front door with its
    /// gateway pointed at the bound RPC address.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        tracing::info!("Starting node");

        let rpc_addr = self
            .config
            .rpc_socket_addr()
            .map_err(|e| NodeError::Startup(e.to_string()))?;

        let backend = Arc::new(StoreBackend::new(self.store.clone()));
        let mut grpc_server = GrpcServer::new(rpc_addr, backend);
        let bound_rpc = grpc_server
            .start()
            .await
            .map_err(|e| NodeError::Startup(format!("Failed to start gRPC server: {}", e)))?;
        self.grpc_server = Some(grpc_server);

        let endpoint = format!("http://{}", dial_addr(bound_rpc));
        tracing::info!("Gateway forwarding to {}", endpoint);
        let gateway = Gateway::connect_lazy(endpoint)
            .map_err(|e| NodeError::Startup(format!("Failed to create gateway: {}", e)))?;

        let http_addr = self
            .config
            .http_socket_addr()
            .map_err(|e| NodeError::Startup(e.to_string()))?;

        let mut http_server = HttpServer::new(http_addr, gateway, self.shutdown_state.clone());
        http_server
            .start()
            .await
            .map_err(|e| NodeError::Startup(format!("Failed to start HTTP server: {}", e)))?;
        self.http_server = Some(http_server);

        tracing::info!("Node started");
        Ok(())
    }

    /// Shutdown the node gracefully.
    ///
    /// Flips the shutdown flag so the probe reports unavailable, then drains
    /// the HTTP server and the gRPC server in that order. Each drain waits at
    /// most `drain_timeout`. The gRPC drain runs even if the HTTP drain
    /// fails; the first error is returned.
    pub async fn shutdown(mut self) -> Result<(), NodeError> {
        tracing::info!("Shutting down node");

        self.shutdown_state.initiate();
        let drain_timeout = self.config.drain_timeout();
        let http_server = self.http_server.take();
        let grpc_server = self.grpc_server.take();

        let http_drain = async move {
            match http_server {
                Some(server) => server.shutdown(drain_timeout).await.map_err(|e| {
                    NodeError::Shutdown(format!("Failed to shutdown HTTP server: {}", e))
                }),
                None => Ok(()),
            }
        };
        let grpc_drain = async move {
            match grpc_server {
                Some(server) => server.shutdown(drain_timeout).await.map_err(|e| {
                    NodeError::Shutdown(format!("Failed to shutdown gRPC server: {}", e))
                }),
                None => Ok(()),
            }
        };

        drain_in_order(http_drain, grpc_drain).await?;

        tracing::info!("Node shutdown complete");
        Ok(())
    }

    pub fn shutdown_state(&self) -> &ShutdownState {
        &self.shutdown_state
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Bound gRPC address once started.
    pub fn rpc_addr(&self) -> Option<SocketAddr> {
        self.grpc_server.as_ref().map(GrpcServer::addr)
    }

    /// Bound HTTP address once started.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_server.as_ref().map(HttpServer::addr)
    }
}

/// Run `first` then `second` to completion, returning the first error.
async fn drain_in_order<A, B>(first: A, second: B) -> Result<(), NodeError>
where
    A: Future<Output = Result<(), NodeError>>,
    B: Future<Output = Result<(), NodeError>>,
{
    let first = first.await;
    if let Err(e) = &first {
        tracing::error!(error = %e, "Drain failed, continuing shutdown");
    }
    let second = second.await;
    first.and(second)
}

/// Address the in-process gateway dials for a server bound to `bound`.
///
/// A wildcard bind is reached over loopback of the same family.
fn dial_addr(bound: SocketAddr) -> SocketAddr {
    match bound.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), bound.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), bound.port())
        }
        _ => bound,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Failed to load store: {0}")]
    Store(#[from] StoreError),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
