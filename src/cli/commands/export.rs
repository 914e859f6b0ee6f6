//! Export command implementation
//!
//! This module implements the `export` command, which runs one export
//! against the configured record source and spreadsheet and prints the
//! response JSON.

use crate::adapters::create_adapters;
use crate::config::load_config;
use crate::core::export::ExportRequest;
use anyhow::Context;
use clap::Args;
use serde_json::Value;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Read the whole request from a JSON file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["model", "fields", "labels", "ids", "domain"])]
    pub request: Option<String>,

    /// Technical model name (e.g. res.partner)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Field paths to export (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Column headers, parallel to --fields (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Record ids to export (comma-separated); take precedence over --domain
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<i64>,

    /// Domain filter as JSON, e.g. '[["active", "=", true]]'
    #[arg(long)]
    pub domain: Option<String>,
}

impl ExportArgs {
    /// Builds the request from the file or the individual flags
    pub fn build_request(&self) -> anyhow::Result<ExportRequest> {
        if let Some(ref path) = self.request {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file {path}"))?;
            return serde_json::from_str(&content)
                .with_context(|| format!("Invalid request JSON in {path}"));
        }

        let model = self
            .model
            .clone()
            .context("--model is required unless --request is given")?;

        let domain = match self.domain {
            Some(ref domain) => match serde_json::from_str::<Value>(domain)
                .context("--domain is not valid JSON")?
            {
                Value::Array(terms) => terms,
                _ => anyhow::bail!("--domain must be a JSON array"),
            },
            None => Vec::new(),
        };

        Ok(ExportRequest::new(model, self.fields.clone())
            .with_labels(self.labels.clone())
            .with_ids(self.ids.clone())
            .with_domain(domain))
    }

    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let request = match self.build_request() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("❌ {e:#}");
                return Ok(2);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration loading failed");
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let adapters = match create_adapters(&config).await {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create adapters");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let coordinator = match adapters.coordinator(&config.parameters).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read export settings");
                eprintln!("Failed to read export settings: {e}");
                return Ok(4);
            }
        };

        let response = coordinator.execute(&request).await;
        println!("{}", serde_json::to_string_pretty(&response)?);

        if response.success {
            eprintln!("✅ {}", response.message.as_deref().unwrap_or("Export completed"));
            Ok(0)
        } else {
            eprintln!("❌ {}", response.error.as_deref().unwrap_or("Export failed"));
            Ok(1)
        }
    }
}
