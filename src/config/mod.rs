//! Configuration management for sheets-export.
//!
//! # Overview
//!
//! Configuration is a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SHEETS_EXPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for every optional setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sheets_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sheets-export.toml")?;
//! println!("Sheets API: {}", config.sheets.api_base_url);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [parameters]
//! source = "postgresql"
//!
//! [records]
//! source = "postgresql"
//!
//! [postgresql]
//! connection_string = "${ODOO_DATABASE_URL}"
//!
//! [server]
//! bind_address = "0.0.0.0:8080"
//! api_token = "${SHEETS_EXPORT_TOKEN}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, LoggingConfig, ParameterSourceKind, ParametersConfig, PostgreSQLConfig,
    RecordSourceKind, RecordsConfig, ServerConfig, SheetsConfig, SheetsExportConfig,
    ValueInputOption,
};
pub use secret::{secret_string, SecretString, SecretValue};
