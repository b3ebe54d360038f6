//! Startup orchestration.
//!
//! Order: metrics exporter, candidate list and dispatcher, then the listener.
//! Any configuration problem is fatal before a single connection is accepted.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::GatewayServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Build every subsystem and serve until `shutdown` fires.
pub async fn run(config: GatewayConfig, shutdown: &Shutdown) -> Result<(), GatewayError> {
    let shutdown_rx = shutdown.subscribe();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = GatewayServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    server.run(listener, shutdown_rx).await?;
    Ok(())
}
