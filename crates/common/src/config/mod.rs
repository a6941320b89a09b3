//! Configuration reader seam
//!
//! Components that take optional tuning from configuration depend on
//! [`ConfigReader`] rather than on a concrete source. The crate ships an
//! in-memory reader and a process-environment reader; richer sources (files,
//! secret stores) live in adapter crates.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Key holding the handle cache TTL in whole seconds
pub const HANDLE_CACHE_TTL_SECONDS_KEY: &str = "HANDLE_CACHE_TTL_SECONDS";
/// TTL used when the key is unset or invalid
pub const DEFAULT_HANDLE_CACHE_TTL_SECONDS: u64 = 3500;

/// Errors raised while reading configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The backing source could not be reached
    #[error("Configuration source unavailable: {0}")]
    Unavailable(String),

    /// The value exists but is not valid text
    #[error("Configuration value for {key} is not valid unicode")]
    NotUnicode { key: String },
}

impl ErrorClassification for ConfigError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

/// Reads optional string values by key
#[async_trait]
pub trait ConfigReader: Send + Sync {
    /// `Ok(None)` when the key is not set
    async fn read_optional(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

/// In-memory reader, mostly for composition roots and tests
#[derive(Debug, Clone, Default)]
pub struct StaticConfigReader {
    values: HashMap<String, String>,
}

impl StaticConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl ConfigReader for StaticConfigReader {
    async fn read_optional(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }
}

/// Reader over the process environment, with an optional key prefix
#[derive(Debug, Clone, Default)]
pub struct EnvConfigReader {
    prefix: Option<String>,
}

impl EnvConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `{prefix}{key}` instead of `key`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }

    fn variable_name(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl ConfigReader for EnvConfigReader {
    async fn read_optional(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let name = self.variable_name(key);
        match std::env::var(&name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { key: name }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_reader() {
        let reader = StaticConfigReader::new().with_value("A", "1");

        assert_eq!(reader.read_optional("A").await, Ok(Some("1".to_string())));
        assert_eq!(reader.read_optional("B").await, Ok(None));
    }

    #[tokio::test]
    async fn test_env_reader_missing_key() {
        let reader = EnvConfigReader::with_prefix("STEADFAST_TEST_UNSET_");
        assert_eq!(reader.read_optional("NOTHING_HERE").await, Ok(None));
    }

    #[test]
    fn test_env_reader_prefix() {
        let reader = EnvConfigReader::with_prefix("APP_");
        assert_eq!(reader.variable_name("HANDLE_CACHE_TTL_SECONDS"), "APP_HANDLE_CACHE_TTL_SECONDS");
        assert_eq!(EnvConfigReader::new().variable_name("X"), "X");
    }
}
