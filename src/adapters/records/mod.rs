//! Record sources
//!
//! - [`MemoryRecordSource`] - JSON dataset held in memory
//! - [`PostgresRecordSource`] - the host framework's PostgreSQL tables

pub mod memory;
pub mod models;
pub mod postgresql;
pub mod traits;

pub use memory::MemoryRecordSource;
pub use models::{FieldKind, FieldSpec};
pub use postgresql::PostgresRecordSource;
pub use traits::RecordSource;
