//! Error kinds for outbound requests
//!
//! [`TransportFailureError`] is the only retryable kind and the only kind a
//! caller of the executor ever receives. [`SendError`] is what a transport or
//! a retried operation yields: either a transport failure (consumes a retry
//! attempt) or an unrelated error (propagates immediately and is wrapped once
//! at the executor boundary).

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::snapshot::FailedResponseSnapshot;
use crate::error::{BoxedError, ErrorClassification, ErrorSeverity};

/// A failed outbound call, optionally enriched with a response snapshot
#[derive(Debug)]
pub struct TransportFailureError {
    message: String,
    snapshot: Option<FailedResponseSnapshot>,
    source: Option<BoxedError>,
}

impl TransportFailureError {
    /// Create an error carrying only a message
    pub fn from_message(message: impl Into<String>) -> Self {
        Self { message: message.into(), snapshot: None, source: None }
    }

    /// Create an error carrying a message and a response snapshot
    pub fn from_message_and_snapshot(
        message: impl Into<String>,
        snapshot: FailedResponseSnapshot,
    ) -> Self {
        Self { message: message.into(), snapshot: Some(snapshot), source: None }
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn snapshot(&self) -> Option<&FailedResponseSnapshot> {
        self.snapshot.as_ref()
    }

    /// Status code of the failed response, if one was received
    pub fn status_code(&self) -> Option<u16> {
        self.snapshot.as_ref().map(FailedResponseSnapshot::status_code)
    }
}

impl fmt::Display for TransportFailureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for TransportFailureError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

impl ErrorClassification for TransportFailureError {
    fn is_retryable(&self) -> bool {
        true
    }

    fn severity(&self) -> ErrorSeverity {
        match self.status_code() {
            Some(status) if (400..500).contains(&status) => ErrorSeverity::Error,
            _ => ErrorSeverity::Warning,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// A response status outside the accepted range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "HttpResponse Status Code Out of Bounds. (CurrentValue=\"{status}\", LowerBound=\"{lower_bound}\", UpperBound=\"{upper_bound}\")"
)]
pub struct StatusOutOfBounds {
    pub status: u16,
    pub lower_bound: u16,
    pub upper_bound: u16,
}

/// Failure of a single send attempt
#[derive(Debug, Error)]
pub enum SendError {
    /// Retryable transport failure
    #[error(transparent)]
    Transport(#[from] TransportFailureError),

    /// Any other error; never retried
    #[error("{0}")]
    Other(#[source] BoxedError),
}

impl SendError {
    /// Wrap an unrelated error
    pub fn other(error: impl Into<BoxedError>) -> Self {
        Self::Other(error.into())
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_out_of_bounds_message() {
        let error = StatusOutOfBounds { status: 503, lower_bound: 200, upper_bound: 299 };
        assert_eq!(
            error.to_string(),
            "HttpResponse Status Code Out of Bounds. (CurrentValue=\"503\", LowerBound=\"200\", UpperBound=\"299\")"
        );
    }

    /// Validates the original cause stays reachable through `source()`.
    ///
    /// Assertions:
    /// - Display shows only the message.
    /// - `source()` yields the wrapped error's message.
    #[test]
    fn test_transport_failure_preserves_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let error = TransportFailureError::from_message("send failed").with_source(cause);

        assert_eq!(error.to_string(), "send failed");
        let source = error.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("reset by peer"));
    }

    #[test]
    fn test_transport_failure_classification() {
        let server = TransportFailureError::from_message_and_snapshot(
            "server error",
            FailedResponseSnapshot::new(502, "https://api.example.com"),
        );
        let client = TransportFailureError::from_message_and_snapshot(
            "client error",
            FailedResponseSnapshot::new(404, "https://api.example.com"),
        );

        assert!(server.is_retryable());
        assert_eq!(server.severity(), ErrorSeverity::Warning);
        assert_eq!(client.severity(), ErrorSeverity::Error);
        assert_eq!(client.status_code(), Some(404));
    }

    #[test]
    fn test_send_error_kinds() {
        let transport: SendError = TransportFailureError::from_message("timeout").into();
        let other = SendError::other("bad header value");

        assert!(transport.is_transport_failure());
        assert!(!other.is_transport_failure());
        assert_eq!(other.to_string(), "bad header value");
    }
}
