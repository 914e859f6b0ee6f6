//! Result type alias for sheets-export

use super::errors::SheetsExportError;

/// Result type alias for sheets-export operations
///
/// # Examples
///
/// ```
/// use sheets_export::domain::result::Result;
/// use sheets_export::domain::errors::SheetsExportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SheetsExportError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SheetsExportError>;
