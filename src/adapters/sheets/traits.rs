//! Spreadsheet service abstraction
//!
//! The export writes through four small capabilities, one per level of
//! the service: connect, open a spreadsheet, pick a worksheet, and edit
//! that worksheet. Each failure carries a [`SheetsError`] so the caller can
//! classify it by the step that failed.

use crate::config::SecretString;
use crate::domain::errors::SheetsError;
use crate::domain::ids::SpreadsheetId;
use async_trait::async_trait;

/// Result type of spreadsheet operations
pub type SheetsResult<T> = std::result::Result<T, SheetsError>;

/// Entry point: turns service account credentials into a session
#[async_trait]
pub trait SheetsConnector: Send + Sync {
    /// Authenticates with service account JSON
    ///
    /// # Errors
    ///
    /// [`SheetsError::InvalidCredentials`] when the JSON is not a usable
    /// key, [`SheetsError::AuthenticationFailed`] when the token endpoint
    /// rejects it.
    async fn authorize(&self, credentials: &SecretString) -> SheetsResult<Box<dyn SheetsSession>>;
}

/// Authenticated access to spreadsheets
#[async_trait]
pub trait SheetsSession: Send + Sync {
    /// Opens a spreadsheet by its key
    async fn open_by_key(&self, id: &SpreadsheetId) -> SheetsResult<Box<dyn Spreadsheet>>;
}

/// An opened spreadsheet
pub trait Spreadsheet: Send + Sync {
    /// Browser URL
    fn url(&self) -> &str;

    /// Document title
    fn title(&self) -> &str;

    /// Worksheet by position, `None` when out of range
    fn worksheet(&self, index: usize) -> Option<Box<dyn Worksheet>>;
}

/// One tab of a spreadsheet
#[async_trait]
pub trait Worksheet: Send + Sync {
    /// Tab title
    fn title(&self) -> &str;

    /// Removes every value
    async fn clear(&self) -> SheetsResult<()>;

    /// Writes rows starting at an A1 cell
    async fn update(&self, values: &[Vec<String>], start_cell: &str) -> SheetsResult<()>;

    /// Freezes the first `rows` rows
    async fn freeze(&self, rows: u32) -> SheetsResult<()>;

    /// Fits column widths to content for columns `start..end`
    async fn auto_resize_columns(&self, start: u32, end: u32) -> SheetsResult<()>;
}
