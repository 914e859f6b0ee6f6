//! Serve command implementation
//!
//! Runs the HTTP server until Ctrl+C or SIGTERM.

use crate::config::load_config;
use crate::server;
use clap::Args;

/// Arguments for the serve command
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override the bind address (e.g. 0.0.0.0:8080)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration loading failed");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        if let Some(ref bind) = self.bind {
            tracing::info!(bind = %bind, "Overriding bind address from CLI");
            config.server.bind_address = bind.clone();
        }

        if let Err(e) = config.validate() {
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        println!("🚀 Serving exports on {}", config.server.bind_address);

        match server::serve(config, shutdown_signal()).await {
            Ok(()) => Ok(0),
            Err(e) => {
                tracing::error!(error = %e, "Server failed");
                eprintln!("Server failed: {e:#}");
                Ok(4)
            }
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), shutting down");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    }
}
