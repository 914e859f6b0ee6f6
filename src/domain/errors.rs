//! Domain error types
//!
//! This module defines the error hierarchy for sheets-export.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main sheets-export error type
///
/// This is the primary error type used throughout the library.
/// It wraps the request-level [`ExportError`] taxonomy and the
/// transport-level [`SheetsError`] of the Google Sheets adapter.
#[derive(Debug, Error)]
pub enum SheetsExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request-level export errors
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Google Sheets API errors
    #[error("Google Sheets error: {0}")]
    Sheets(#[from] SheetsError),

    /// Host database errors
    #[error("Database error: {0}")]
    Database(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Request-level export errors
///
/// Every variant is caught at the coordinator boundary and surfaced as
/// `{success: false, error: <message>}`. The messages match what the web
/// client's export dialog already displays.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Service account credentials are not configured
    #[error("Google credentials not configured. Add 'google_sheets.credentials_json' in System Parameters")]
    MissingCredentials,

    /// Target spreadsheet identifier is not configured
    #[error("Spreadsheet ID not configured. Add \"google_sheets.spreadsheet_id\" in System Parameters")]
    MissingSpreadsheetId,

    /// Neither record ids nor a filter were supplied
    #[error("No records selected")]
    NoSelection,

    /// The selection resolved to zero records
    #[error("No records to export")]
    NoRecords,

    /// The spreadsheet could not be opened
    #[error("Could not open spreadsheet: {0}")]
    SpreadsheetUnavailable(String),

    /// The spreadsheet has no first worksheet
    #[error("Could not access the first worksheet")]
    WorksheetUnavailable,

    /// Authentication against the spreadsheet service failed
    #[error("Google authentication failed: {0}")]
    AuthenticationFailure(String),

    /// Clearing, writing or freezing the worksheet failed
    #[error("Failed to write worksheet: {0}")]
    WriteFailure(String),

    /// The request itself is malformed
    #[error("Invalid export request: {0}")]
    InvalidRequest(String),

    /// The record source failed to load records
    #[error("Failed to load records: {0}")]
    DataAccess(String),
}

/// Google Sheets transport errors
///
/// Errors that occur when talking to the OAuth2 token endpoint or the
/// Sheets v4 API. These errors don't expose `reqwest` types.
#[derive(Debug, Clone, Error)]
pub enum SheetsError {
    /// Failed to reach the API
    #[error("Failed to connect to Google API: {0}")]
    ConnectionFailed(String),

    /// Service account credentials could not be parsed or used
    #[error("Invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// Token exchange was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Spreadsheet or range not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("Request failed: {status} - {message}")]
    RequestFailed { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SheetsExportError {
    fn from(err: std::io::Error) -> Self {
        SheetsExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SheetsExportError {
    fn from(err: serde_json::Error) -> Self {
        SheetsExportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SheetsExportError {
    fn from(err: toml::de::Error) -> Self {
        SheetsExportError::Configuration(format!("TOML parse error: {err}"))
    }
}
