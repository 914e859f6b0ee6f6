//! Record source abstraction
//!
//! A record source materializes [`Record`] snapshots for the exporter. The
//! [`FieldSelection`] tells it which relations to expand and how deep;
//! related records always carry their scalar fields so display names are
//! available.

use crate::core::selection::FieldSelection;
use crate::domain::filter::Domain;
use crate::domain::ids::{ModelName, RecordId};
use crate::domain::record::Record;
use crate::domain::Result;
use async_trait::async_trait;

/// Read access to business records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Human-readable backend name for logs
    fn source_name(&self) -> &str;

    /// Loads records by id
    ///
    /// Records come back in the order of `ids`. Ids that do not exist are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or the backend fails.
    async fn browse(
        &self,
        model: &ModelName,
        ids: &[RecordId],
        selection: &FieldSelection,
    ) -> Result<Vec<Record>>;

    /// Loads every record matching a filter, ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown, the filter names a field
    /// the backend cannot filter on, or the backend fails.
    async fn search(
        &self,
        model: &ModelName,
        domain: &Domain,
        selection: &FieldSelection,
    ) -> Result<Vec<Record>>;
}
