//! Server startup and lifecycle

use crate::{routes, AppState, GatewayConfig};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Run the gateway until the process is killed
pub async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    run_server_with_shutdown(config, std::future::pending()).await
}

/// Run the gateway until `shutdown_signal` resolves
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let state = Arc::new(AppState::new(config)?);
    serve(listener, state, shutdown_signal).await
}

/// Serve the REST API on an already bound listener
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, disks = state.vfs.disks().len(), "NAS gateway listening");

    axum::serve(listener, routes::create_router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Gateway shutdown complete");
    Ok(())
}
