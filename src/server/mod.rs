//! Server lifecycle management
//!
//! Binds the configured listener and serves the gateway router until the
//! process is stopped.

use anyhow::{Context, Result};
use tokio::net::TcpListener;

mod router;

pub use router::build_router;

use crate::config::NetworkConfig;
use crate::state::AppState;

/// Bind the HTTP listener and serve the gateway until shutdown.
pub async fn serve(network: &NetworkConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", network.http_bind_addr, network.http_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(addr = %addr, "flag bot gateway listening");

    let router = build_router(state);
    axum::serve(listener, router).await.context("serve gateway")
}
