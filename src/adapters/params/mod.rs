//! System parameter stores
//!
//! The exporter reads two parameters: the service account JSON and the
//! target spreadsheet id.

pub mod memory;
pub mod postgresql;
pub mod traits;

pub use memory::StaticParameterStore;
pub use postgresql::PostgresParameterStore;
pub use traits::ParameterStore;
