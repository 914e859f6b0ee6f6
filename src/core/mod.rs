//! Core business logic for sheets-export.
//!
//! # Modules
//!
//! - [`format`] - Field path resolution and cell formatting
//! - [`selection`] - Prefetch tree derived from the requested field paths
//! - [`export`] - Request handling, grid construction and coordination
//!
//! # Export Workflow
//!
//! 1. **Settings**: Read the spreadsheet id and credentials from the parameter store
//! 2. **Select**: Browse explicit ids or search with a domain filter
//! 3. **Render**: Resolve each field path and format it as a cell
//! 4. **Write**: Clear the first worksheet, write the grid from `A1`, freeze the header
//! 5. **Tidy**: Auto-resize the written columns
//!
//! # Example
//!
//! ```rust,no_run
//! use sheets_export::adapters::params::StaticParameterStore;
//! use sheets_export::adapters::records::MemoryRecordSource;
//! use sheets_export::adapters::sheets::GoogleSheetsConnector;
//! use sheets_export::config::SheetsConfig;
//! use sheets_export::core::export::{ExportCoordinator, ExportRequest, ExportSettings};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StaticParameterStore::default()
//!     .with_param("google_sheets.spreadsheet_id", "1AbCdEf")
//!     .with_param("google_sheets.credentials_json", std::fs::read_to_string("key.json")?);
//! let settings = ExportSettings::load(
//!     &store,
//!     "google_sheets.credentials_json",
//!     "google_sheets.spreadsheet_id",
//! )
//! .await?;
//!
//! let records = Arc::new(MemoryRecordSource::from_path("dataset.json").await?);
//! let sheets = Arc::new(GoogleSheetsConnector::new(SheetsConfig::default())?);
//! let coordinator = ExportCoordinator::new(settings, records, sheets);
//!
//! let request = ExportRequest::new("res.partner", vec!["name".into(), "email".into()])
//!     .with_ids(vec![1, 2, 3]);
//! let response = coordinator.execute(&request).await;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod format;
pub mod selection;
