//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the sheets-export configuration file.

use crate::adapters::postgresql::client::redact_connection_string;
use crate::config::schema::{ParameterSourceKind, RecordSourceKind};
use crate::config::load_config;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);

        match config.parameters.source {
            ParameterSourceKind::Static => println!(
                "  Parameters: static ({} values)",
                config.parameters.values.len()
            ),
            ParameterSourceKind::PostgreSQL => println!("  Parameters: postgresql"),
        }
        println!("    Credentials Key: {}", config.parameters.credentials_key);
        println!("    Spreadsheet Key: {}", config.parameters.spreadsheet_id_key);

        match config.records.source {
            RecordSourceKind::Memory => println!(
                "  Records: memory ({})",
                config.records.dataset_path.as_deref().unwrap_or("-")
            ),
            RecordSourceKind::PostgreSQL => println!("  Records: postgresql"),
        }

        if let Some(ref pg_config) = config.postgresql {
            println!(
                "  PostgreSQL Connection: {}",
                redact_connection_string(pg_config.connection_string.expose_secret().as_str())
            );
            println!("  Max Connections: {}", pg_config.max_connections);
        }

        println!("  Sheets API: {}", config.sheets.api_base_url);
        println!(
            "  Value Input Option: {}",
            config.sheets.value_input_option.as_str()
        );
        println!("  Server Bind Address: {}", config.server.bind_address);
        println!(
            "  API Token: {}",
            if config.server.api_token.is_some() {
                "configured"
            } else {
                "none"
            }
        );
        println!();
        Ok(0)
    }
}
