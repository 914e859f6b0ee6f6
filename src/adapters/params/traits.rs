//! Parameter store abstraction

use crate::config::SecretString;
use crate::domain::Result;
use async_trait::async_trait;

/// Key/value lookup of system parameters
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Looks up a parameter
    ///
    /// Returns `None` when the key is not set. Values are wrapped as
    /// secrets because the credentials parameter holds a private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    async fn get_param(&self, key: &str) -> Result<Option<SecretString>>;
}
