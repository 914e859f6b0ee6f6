//! Domain models and types for sheets-export.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ModelName`], [`RecordId`], [`FieldPath`], [`SpreadsheetId`])
//! - **Record snapshots** ([`Record`], [`FieldValue`], [`HasDisplayName`])
//! - **Filter expressions** ([`Domain`])
//! - **Error types** ([`SheetsExportError`], [`ExportError`], [`SheetsError`])
//! - **Result type alias** ([`Result`])
//!
//! # Records
//!
//! Records are immutable snapshots. Relational fields carry the related
//! records, so a field path can be walked without a round trip:
//!
//! ```rust
//! use sheets_export::domain::{FieldValue, ModelName, Record, RecordId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let country = Record::new(ModelName::new("res.country")?, RecordId::new(1)?)
//!     .with_field("name", FieldValue::text("Belgium"));
//! let partner = Record::new(ModelName::new("res.partner")?, RecordId::new(7)?)
//!     .with_field("name", FieldValue::text("Alice"))
//!     .with_field("country_id", FieldValue::reference(country));
//! assert!(partner.get("country_id").unwrap().is_truthy());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod filter;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{ExportError, SheetsError, SheetsExportError};
pub use filter::{Condition, Domain, Operator};
pub use ids::{FieldPath, ModelName, RecordId, SpreadsheetId};
pub use record::{FieldValue, HasDisplayName, Record};
pub use result::Result;
