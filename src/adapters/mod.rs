//! External system integrations for sheets-export.
//!
//! This module provides adapters for the systems an export touches:
//!
//! - [`params`] - System parameter lookup (spreadsheet id, credentials)
//! - [`records`] - Business record access (in-memory dataset or host database)
//! - [`postgresql`] - Shared PostgreSQL connection pool
//! - [`sheets`] - Google Sheets v4 client
//! - [`factory`] - Builds the adapters selected by configuration
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. Each seam is an `async_trait`
//! trait consumed as `Arc<dyn Trait>`.
//!
//! ```rust,no_run
//! use sheets_export::adapters::factory::create_adapters;
//! use sheets_export::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sheets-export.toml")?;
//! let adapters = create_adapters(&config).await?;
//! let coordinator = adapters.coordinator(&config.parameters).await?;
//! # Ok(())
//! # }
//! ```

pub mod factory;
pub mod params;
pub mod postgresql;
pub mod records;
pub mod sheets;

pub use factory::{create_adapters, Adapters};
