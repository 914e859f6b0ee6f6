//! Google Sheets adapter
//!
//! Service account authentication plus the handful of Sheets v4 calls an
//! export needs: open a spreadsheet, clear and fill its first worksheet,
//! freeze the header row and fit the columns.

pub mod auth;
pub mod client;
pub mod models;
pub mod traits;

pub use auth::{ServiceAccountKey, SCOPES};
pub use client::{GoogleSheetsConnector, GoogleSheetsSession};
pub use traits::{SheetsConnector, SheetsResult, SheetsSession, Spreadsheet, Worksheet};
