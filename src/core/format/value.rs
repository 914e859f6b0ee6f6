//! Value formatting
//!
//! Turns one resolved [`FieldValue`] into the string written to a cell.
//! Formatting is total: every value has a display string.

use crate::domain::record::{FieldValue, HasDisplayName, TIMESTAMP_FORMAT};

/// Cell text for `true`
pub const YES: &str = "Yes";

/// Cell text for `false`
pub const NO: &str = "No";

/// Separator between elements of a multi-record value
pub const LIST_SEPARATOR: &str = ", ";

/// Formats a field value for a spreadsheet cell
///
/// Rules, in priority order:
/// 1. timestamps print as `YYYY-MM-DD HH:MM:SS`
/// 2. a single reference prints its display name, or nothing
/// 3. a collection prints each element's display name (or its handle when it
///    has none), joined with `", "`
/// 4. booleans print as `Yes` / `No`
/// 5. null prints as an empty string
/// 6. anything else uses its plain string form
///
/// # Examples
///
/// ```
/// use sheets_export::core::format::format_value;
/// use sheets_export::domain::FieldValue;
///
/// assert_eq!(format_value(&FieldValue::Boolean(true)), "Yes");
/// assert_eq!(format_value(&FieldValue::Float(3.0)), "3.0");
/// assert_eq!(format_value(&FieldValue::Null), "");
/// ```
pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        FieldValue::Reference(Some(record)) => record.display_name().unwrap_or_default(),
        FieldValue::Reference(None) => String::new(),
        FieldValue::References(records) => records
            .iter()
            .map(|record| {
                record
                    .display_name()
                    .unwrap_or_else(|| record.to_string())
            })
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        FieldValue::Boolean(true) => YES.to_string(),
        FieldValue::Boolean(false) => NO.to_string(),
        FieldValue::Null => String::new(),
        other => other.to_string(),
    }
}
