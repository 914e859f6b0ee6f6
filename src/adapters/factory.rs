//! Adapter factory
//!
//! Creates the parameter store, record source and spreadsheet connector
//! selected by the configuration. When both stores live in the host
//! database they share one [`PostgreSQLClient`] and its connection pool.

use crate::adapters::params::{ParameterStore, PostgresParameterStore, StaticParameterStore};
use crate::adapters::postgresql::PostgreSQLClient;
use crate::adapters::records::{MemoryRecordSource, PostgresRecordSource, RecordSource};
use crate::adapters::sheets::{GoogleSheetsConnector, SheetsConnector};
use crate::config::schema::{
    ParameterSourceKind, ParametersConfig, RecordSourceKind, SheetsExportConfig,
};
use crate::core::export::{ExportCoordinator, ExportSettings};
use crate::domain::errors::SheetsExportError;
use crate::domain::Result;
use std::sync::Arc;

/// The collaborators of an export
#[derive(Clone)]
pub struct Adapters {
    pub parameters: Arc<dyn ParameterStore>,
    pub records: Arc<dyn RecordSource>,
    pub sheets: Arc<dyn SheetsConnector>,
}

impl Adapters {
    /// Reads the current export settings and builds a coordinator
    ///
    /// Settings are read on every call so parameter changes apply to the
    /// next export without a restart.
    pub async fn coordinator(&self, parameters: &ParametersConfig) -> Result<ExportCoordinator> {
        let settings = ExportSettings::load(
            self.parameters.as_ref(),
            &parameters.credentials_key,
            &parameters.spreadsheet_id_key,
        )
        .await?;

        Ok(ExportCoordinator::new(
            settings,
            self.records.clone(),
            self.sheets.clone(),
        ))
    }
}

/// Create the shared PostgreSQL client when any store needs it
///
/// # Errors
///
/// Returns an error if a store is backed by PostgreSQL but the
/// `[postgresql]` section is missing, or the pool cannot be built.
pub fn create_postgresql_client(
    config: &SheetsExportConfig,
) -> Result<Option<Arc<PostgreSQLClient>>> {
    if !config.needs_postgresql() {
        return Ok(None);
    }

    let pg_config = config.postgresql.as_ref().ok_or_else(|| {
        SheetsExportError::Configuration(
            "[postgresql] section is required when a source is 'postgresql'".to_string(),
        )
    })?;

    tracing::info!("Creating PostgreSQL client");
    Ok(Some(Arc::new(PostgreSQLClient::new(pg_config.clone())?)))
}

fn require_client(
    client: Option<&Arc<PostgreSQLClient>>,
    what: &str,
) -> Result<Arc<PostgreSQLClient>> {
    client.cloned().ok_or_else(|| {
        SheetsExportError::Configuration(format!("{what} requires a PostgreSQL client"))
    })
}

/// Create the parameter store named by `[parameters] source`
pub fn create_parameter_store(
    config: &SheetsExportConfig,
    client: Option<&Arc<PostgreSQLClient>>,
) -> Result<Arc<dyn ParameterStore>> {
    match config.parameters.source {
        ParameterSourceKind::Static => {
            tracing::info!(
                count = config.parameters.values.len(),
                "Creating static parameter store"
            );
            Ok(Arc::new(StaticParameterStore::new(
                config.parameters.values.clone(),
            )))
        }
        ParameterSourceKind::PostgreSQL => {
            tracing::info!("Creating PostgreSQL parameter store");
            let client = require_client(client, "PostgreSQL parameter store")?;
            Ok(Arc::new(PostgresParameterStore::new(client)))
        }
    }
}

/// Create the record source named by `[records] source`
pub async fn create_record_source(
    config: &SheetsExportConfig,
    client: Option<&Arc<PostgreSQLClient>>,
) -> Result<Arc<dyn RecordSource>> {
    match config.records.source {
        RecordSourceKind::Memory => {
            let path = config.records.dataset_path.as_deref().ok_or_else(|| {
                SheetsExportError::Configuration(
                    "records.dataset_path is required for the memory source".to_string(),
                )
            })?;

            tracing::info!(dataset = %path, "Loading in-memory record source");
            Ok(Arc::new(MemoryRecordSource::from_path(path).await?))
        }
        RecordSourceKind::PostgreSQL => {
            tracing::info!("Creating PostgreSQL record source");
            let client = require_client(client, "PostgreSQL record source")?;
            Ok(Arc::new(PostgresRecordSource::new(client)))
        }
    }
}

/// Create the Google Sheets connector
pub fn create_sheets_connector(config: &SheetsExportConfig) -> Result<Arc<dyn SheetsConnector>> {
    tracing::debug!(api_base_url = %config.sheets.api_base_url, "Creating Google Sheets connector");
    Ok(Arc::new(GoogleSheetsConnector::new(config.sheets.clone())?))
}

/// Create every adapter, sharing one PostgreSQL client between the stores
///
/// # Errors
///
/// Returns an error if any adapter cannot be created
pub async fn create_adapters(config: &SheetsExportConfig) -> Result<Adapters> {
    let client = create_postgresql_client(config)?;

    Ok(Adapters {
        parameters: create_parameter_store(config, client.as_ref())?,
        records: create_record_source(config, client.as_ref()).await?,
        sheets: create_sheets_connector(config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_create_adapters_from_memory_config() {
        let mut dataset = tempfile::NamedTempFile::new().unwrap();
        write!(
            dataset,
            r#"{{"models": {{"res.partner": {{"fields": {{"name": {{"type": "char"}}}}, "records": [{{"id": 1, "name": "Alice"}}]}}}}}}"#
        )
        .unwrap();

        let mut config = SheetsExportConfig::default();
        config.records.source = RecordSourceKind::Memory;
        config.records.dataset_path = Some(dataset.path().display().to_string());

        let adapters = create_adapters(&config).await.unwrap();
        assert_eq!(adapters.records.source_name(), "memory");
        assert!(adapters
            .parameters
            .get_param("google_sheets.spreadsheet_id")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_postgresql_source_without_section_fails() {
        let mut config = SheetsExportConfig::default();
        config.parameters.source = ParameterSourceKind::PostgreSQL;

        assert!(matches!(
            create_postgresql_client(&config),
            Err(SheetsExportError::Configuration(_))
        ));
    }

    #[test]
    fn test_no_client_for_static_and_memory() {
        let mut config = SheetsExportConfig::default();
        config.records.source = RecordSourceKind::Memory;
        assert!(create_postgresql_client(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_source_requires_dataset_path() {
        let mut config = SheetsExportConfig::default();
        config.records.source = RecordSourceKind::Memory;
        config.records.dataset_path = None;

        assert!(create_record_source(&config, None).await.is_err());
    }
}
