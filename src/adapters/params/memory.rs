//! Parameter store over a fixed map

use super::traits::ParameterStore;
use crate::config::{secret_string, SecretString};
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Parameters taken from configuration (or set programmatically)
#[derive(Debug, Clone, Default)]
pub struct StaticParameterStore {
    values: BTreeMap<String, SecretString>,
}

impl StaticParameterStore {
    /// Creates a store over the given values
    pub fn new(values: BTreeMap<String, SecretString>) -> Self {
        Self { values }
    }

    /// Adds a parameter (builder style)
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), secret_string(value.into()));
        self
    }

    /// Number of stored parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameter is stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl ParameterStore for StaticParameterStore {
    async fn get_param(&self, key: &str) -> Result<Option<SecretString>> {
        Ok(self.values.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_get_param() {
        let store = StaticParameterStore::default()
            .with_param("google_sheets.spreadsheet_id", "1AbC");

        let value = store.get_param("google_sheets.spreadsheet_id").await.unwrap();
        assert_eq!(value.unwrap().expose_secret(), "1AbC");
        assert!(store.get_param("google_sheets.credentials_json").await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }
}
