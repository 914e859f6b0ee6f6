//! PostgreSQL client for the host database
//!
//! Pooled read access shared by the PostgreSQL record source and
//! parameter store.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{Result, SheetsExportError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// Connections are opened lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or the
    /// pool cannot be built.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_str()
            .parse()
            .map_err(|e| {
                SheetsExportError::Configuration(format!(
                    "Invalid PostgreSQL connection string: {e}"
                ))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .build()
            .map_err(|e| {
                SheetsExportError::Database(format!("Failed to create connection pool: {e}"))
            })?;

        tracing::debug!(
            target_db = %redact_connection_string(config.connection_string.expose_secret().as_str()),
            max_connections = config.max_connections,
            "Created PostgreSQL pool"
        );

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        self.query("SELECT 1", &[]).await?;
        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            SheetsExportError::Database(format!("Failed to get connection from pool: {e}"))
        })
    }

    /// Execute a query and return rows
    ///
    /// The configured statement timeout applies to the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.get_connection().await?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client.batch_execute(&timeout_query).await.map_err(|e| {
            SheetsExportError::Database(format!("Failed to set statement timeout: {e}"))
        })?;

        tracing::trace!(sql = query, params = params.len(), "Executing query");
        client
            .query(query, params)
            .await
            .map_err(|e| SheetsExportError::Database(format!("Query failed: {e}")))
    }

    /// Connection target with the credentials removed
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_str())
    }
}

/// Replaces the user and password of a connection string with `***`
pub fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{host}"))
        .unwrap_or_else(|| "postgresql://***".to_string())
}
