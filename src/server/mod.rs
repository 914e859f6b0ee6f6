//! HTTP server exposing the export endpoint
//!
//! - `POST /web/export/google_sheets` - run an export (JSON-RPC 2.0 or bare JSON)
//! - `GET /health` - liveness probe
//!
//! When `server.api_token` is set, export calls must carry it as a bearer
//! token.

pub mod routes;

pub use routes::{create_router, AppState, EXPORT_ROUTE};

use crate::adapters::create_adapters;
use crate::config::SheetsExportConfig;
use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;

/// Builds the adapters and serves until `shutdown` resolves
pub async fn serve(
    config: SheetsExportConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind_address))?;

    let adapters = create_adapters(&config).await?;
    let state = AppState::new(
        adapters,
        config.parameters.clone(),
        config.server.api_token.clone(),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(address = %addr, "Listening for export requests");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}
