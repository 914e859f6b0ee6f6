//! Parameter store over the host framework's `ir_config_parameter` table

use super::traits::ParameterStore;
use crate::adapters::postgresql::PostgreSQLClient;
use crate::config::{secret_string, SecretString};
use crate::domain::{Result, SheetsExportError};
use async_trait::async_trait;
use std::sync::Arc;

const PARAM_QUERY: &str = "SELECT value FROM ir_config_parameter WHERE key = $1";

/// System parameters read from the host database
pub struct PostgresParameterStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgresParameterStore {
    /// Creates a store sharing an existing client
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for PostgresParameterStore {
    async fn get_param(&self, key: &str) -> Result<Option<SecretString>> {
        let rows = self.client.query(PARAM_QUERY, &[&key]).await?;

        match rows.first() {
            Some(row) => {
                let value: Option<String> = row.try_get(0).map_err(|e| {
                    SheetsExportError::Database(format!("Unexpected value for parameter {key}: {e}"))
                })?;
                tracing::debug!(key = key, found = value.is_some(), "Read system parameter");
                Ok(value.map(secret_string))
            }
            None => {
                tracing::debug!(key = key, found = false, "Read system parameter");
                Ok(None)
            }
        }
    }
}
