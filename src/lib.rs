// sheets-export - Google Sheets export for ERP records
// Copyright (c) 2025 Sheets Export Contributors
// Licensed under the MIT License

//! # sheets-export - Google Sheets export for ERP records
//!
//! sheets-export writes a selection of ERP business records into the first
//! worksheet of a Google spreadsheet: one header row, then one row per
//! record, with relational field paths such as `partner_id/country_id/name`
//! resolved and every value rendered as display text.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Selecting** records by id or with a prefix-notation domain filter
//! - **Resolving** slash-delimited field paths across relations
//! - **Formatting** values as cells (`Yes`/`No`, dates, display names)
//! - **Writing** the grid through the Google Sheets v4 API
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (field selection, formatting, export orchestration)
//! - [`adapters`] - External integrations (parameters, records, Google Sheets)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`server`] - HTTP endpoint for the web client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheets_export::adapters::create_adapters;
//! use sheets_export::config::load_config;
//! use sheets_export::core::export::ExportRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("sheets-export.toml")?;
//!     let adapters = create_adapters(&config).await?;
//!     let coordinator = adapters.coordinator(&config.parameters).await?;
//!
//!     let request = ExportRequest::new("res.partner", vec!["name".into(), "active".into()])
//!         .with_labels(vec!["Name".into(), "Active".into()])
//!         .with_ids(vec![1, 2]);
//!
//!     let response = coordinator.execute(&request).await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], aliasing
//! [`domain::SheetsExportError`]. Export failures are classified as
//! [`domain::ExportError`] and reported as `{success: false, error}`
//! rather than propagated.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;
