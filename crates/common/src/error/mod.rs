//! Common error types and classification
//!
//! Two kinds of failure ever reach a caller of this crate:
//!
//! 1. **Operational** failures of an outbound call, always delivered as
//!    [`TransportFailureError`](crate::http::TransportFailureError).
//! 2. **Misuse** of a constructor or builder, delivered synchronously as
//!    [`ConstructionError`]. These are never retried or wrapped.
//!
//! Every public error type implements [`ErrorClassification`] so callers can
//! make retry and alerting decisions without matching on concrete variants.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case |
//! |-------|----------|
//! | **Info** | Expected conditions, e.g. a cache rebuild |
//! | **Warning** | Degraded but operational, e.g. a transient transport failure |
//! | **Error** | Failure requiring attention, e.g. invalid configuration |
//! | **Critical** | System integrity at risk |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Boxed error type used for causes that cross component boundaries
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for constructors and builders
pub type ConstructionResult<T> = Result<T, ConstructionError>;

/// Errors raised when a component is assembled with invalid inputs
///
/// Construction errors indicate caller misuse. They are raised before any
/// I/O happens and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A required collaborator was not supplied to a builder
    #[error("{dependency} is required and cannot be missing")]
    MissingDependency { dependency: &'static str },

    /// One or more named retry policies were registered under an empty name
    #[error("All named retry policy names must be non-empty. Invalid entries: {entries:?}")]
    InvalidPolicyNames { entries: Vec<String> },

    /// Retry parameters are out of range
    #[error("Invalid retry configuration: {message}")]
    InvalidRetryConfiguration { message: String },

    /// Any other configuration value is out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ConstructionError {
    /// Create a retry configuration error
    pub fn retry(message: impl Into<String>) -> Self {
        Self::InvalidRetryConfiguration { message: message.into() }
    }

    /// Create a general configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration { message: message.into() }
    }
}

impl ErrorClassification for ConstructionError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Trait for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as timeouts or a response outside the accepted status
    /// range.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
