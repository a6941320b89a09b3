//! Infrastructure error type
//!
//! [`InfraError`] covers failures of the impure adapters: building the
//! reqwest client, loading settings and installing the tracing subscriber.
//! Per-request failures never use it; they flow through
//! [`SendError`](steadfast_common::http::SendError) so the retry policy can
//! classify them.

pub mod conversions;

use std::path::PathBuf;
use std::time::Duration;

use steadfast_common::error::{ConstructionError, ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Result alias for infrastructure operations
pub type InfraResult<T> = Result<T, InfraError>;

#[derive(Debug, Error)]
pub enum InfraError {
    /// Settings are missing, malformed or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// A settings file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The underlying HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A request URI did not parse
    #[error("Invalid request URI \"{uri}\": {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    /// A tracing subscriber is already installed or the filter is invalid
    #[error("Failed to initialize tracing: {0}")]
    Tracing(String),

    /// Assembling a common component failed
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

impl ErrorClassification for InfraError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Tracing(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
