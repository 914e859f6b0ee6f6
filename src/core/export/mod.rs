//! Export orchestration
//!
//! This module provides the export pipeline:
//! - Request and response payloads exchanged with the web client
//! - Grid construction (header plus one row per record)
//! - Export coordination against the record source and spreadsheet service

pub mod coordinator;
pub mod grid;
pub mod request;

pub use coordinator::{ExportCoordinator, ExportSettings};
pub use grid::ExportGrid;
pub use request::{ExportOutcome, ExportRequest, ExportResponse, Selection};
