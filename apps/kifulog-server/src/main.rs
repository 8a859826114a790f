use anyhow::Context;
use kifulog_server::config::ServerConfig;
use kifulog_server::node::Node;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Parse CLI args for config file path
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "kifulog.yaml".to_string());

    tracing::info!("Loading configuration from: {}", config_path);

    // Try file first, fall back to env
    let config = if std::path::Path::new(&config_path).exists() {
        ServerConfig::load_from_file(&config_path)
            .with_context(|| format!("loading {}", config_path))?
    } else {
        tracing::warn!("Config file not found, loading from environment variables");
        ServerConfig::load_from_env().context("loading configuration from environment")?
    };

    tracing::info!("RPC address: {}", config.rpc_addr);
    tracing::info!("HTTP address: {}", config.http_addr);

    let mut node = Node::new(config).await.context("initializing node")?;
    node.start().await.context("starting node")?;

    tracing::info!("kifulog server is ready");

    wait_for_signal().await?;

    tracing::info!("Received shutdown signal, gracefully shutting down...");
    node.shutdown().await.context("shutting down node")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("waiting for Ctrl-C")?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")
}
