//! Mock implementations of the crate's seams
//!
//! Every mock is cheap to clone and clones share state, so a test can hand
//! one clone to the component under test and inspect another.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cache_aside::{CacheAsideError, HandleCreator, TokenProvider};
use crate::config::{ConfigError, ConfigReader};
use crate::http::{HttpRequest, HttpResponse, SendError, Transport, TransportFailureError};
use crate::resilience::clock::MockClock;

/// What a [`MockTransport`] does with one request
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this response
    Respond(HttpResponse),
    /// Fail with a retryable transport failure carrying this message
    TransportFailure(String),
    /// Fail with an unrelated, non-retryable error
    Unrelated(String),
}

impl MockOutcome {
    fn into_result(self) -> Result<HttpResponse, SendError> {
        match self {
            Self::Respond(response) => Ok(response),
            Self::TransportFailure(message) => {
                Err(SendError::Transport(TransportFailureError::from_message(message)))
            }
            Self::Unrelated(message) => Err(SendError::other(message)),
        }
    }
}

/// Mock transport replaying queued outcomes
///
/// Queued outcomes are consumed in order. Once the queue is empty the
/// fallback (if any) answers every request.
///
/// # Examples
///
/// ```
/// use steadfast_common::http::{HttpRequest, HttpResponse, Transport};
/// use steadfast_common::testing::mocks::{MockOutcome, MockTransport};
///
/// # tokio_test::block_on(async {
/// let transport = MockTransport::new();
/// transport.push(MockOutcome::Respond(HttpResponse::new(200, "https://api.example.com")));
///
/// let response = transport.send(&HttpRequest::get("https://api.example.com")).await.unwrap();
/// assert_eq!(response.status(), 200);
/// assert_eq!(transport.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    fallback: Arc<Mutex<Option<MockOutcome>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        let transport = Self::new();
        transport.outcomes.lock().extend(outcomes);
        transport
    }

    /// Sleep for `delay` before answering each request
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, outcome: MockOutcome) {
        self.outcomes.lock().push_back(outcome);
    }

    pub fn set_fallback(&self, outcome: MockOutcome) {
        *self.fallback.lock() = Some(outcome);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    fn next_outcome(&self) -> Option<MockOutcome> {
        self.outcomes.lock().pop_front().or_else(|| self.fallback.lock().clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_outcome() {
            Some(outcome) => outcome.into_result(),
            None => Err(SendError::other("MockTransport has no outcome queued")),
        }
    }
}

/// Mock token provider replaying queued tokens and failures
#[derive(Debug, Clone, Default)]
pub struct MockTokenProvider {
    tokens: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens<S: Into<String>>(tokens: impl IntoIterator<Item = S>) -> Self {
        let provider = Self::new();
        provider.tokens.lock().extend(tokens.into_iter().map(|token| Ok(token.into())));
        provider
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_token(&self, token: impl Into<String>) {
        self.tokens.lock().push_back(Ok(token.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.tokens.lock().push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn get_token(&self) -> Result<String, CacheAsideError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.tokens.lock().pop_front() {
            Some(Ok(token)) => Ok(token),
            Some(Err(message)) => Err(CacheAsideError::construction(message)),
            None => Err(CacheAsideError::construction("MockTokenProvider has no token queued")),
        }
    }
}

/// Mock handle creator producing `handle-1`, `handle-2`, ...
#[derive(Debug, Clone, Default)]
pub struct MockHandleCreator {
    calls: Arc<AtomicUsize>,
    failures: Arc<Mutex<VecDeque<String>>>,
    clock_step: Option<(MockClock, Duration)>,
    delay: Option<Duration>,
}

impl MockHandleCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `clock` by `step` during every creation
    #[must_use]
    pub fn advancing(mut self, clock: MockClock, step: Duration) -> Self {
        self.clock_step = Some((clock, step));
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next creation fail with `message`
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failures.lock().push_back(message.into());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P: Send + Sync + 'static> HandleCreator<P, String> for MockHandleCreator {
    async fn create_handle(&self, _parameters: &P) -> Result<String, CacheAsideError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((clock, step)) = &self.clock_step {
            clock.advance(*step);
        }
        if let Some(message) = self.failures.lock().pop_front() {
            return Err(CacheAsideError::construction(message));
        }
        Ok(format!("handle-{call}"))
    }
}

/// Mock configuration reader counting reads
#[derive(Debug, Clone, Default)]
pub struct MockConfigReader {
    values: Arc<Mutex<HashMap<String, String>>>,
    failure: Option<String>,
    reads: Arc<AtomicUsize>,
}

impl MockConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader whose every read fails as unavailable
    pub fn failing(message: impl Into<String>) -> Self {
        Self { failure: Some(message.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.lock().insert(key.into(), value.into());
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigReader for MockConfigReader {
    async fn read_optional(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(ConfigError::Unavailable(message.clone()));
        }
        Ok(self.values.lock().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_queue_then_fallback() {
        let transport = MockTransport::with_outcomes([MockOutcome::TransportFailure(
            "connection reset".to_string(),
        )]);
        transport.set_fallback(MockOutcome::Respond(HttpResponse::new(204, "https://a")));
        let request = HttpRequest::get("https://a");

        let first = transport.send(&request).await;
        assert!(matches!(first, Err(SendError::Transport(_))));
        assert_eq!(transport.send(&request).await.unwrap().status(), 204);
        assert_eq!(transport.send(&request).await.unwrap().status(), 204);
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_without_outcomes() {
        let transport = MockTransport::new();
        let result = transport.send(&HttpRequest::get("https://a")).await;
        assert!(matches!(result, Err(SendError::Other(_))));
    }

    #[tokio::test]
    async fn test_mock_handle_creator_numbers_handles() {
        let creator = MockHandleCreator::new();
        creator.fail_next("quota exceeded");

        let first: Result<String, _> = creator.create_handle(&()).await;
        assert!(first.is_err());
        assert_eq!(creator.create_handle(&()).await.unwrap(), "handle-2");
        assert_eq!(creator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_config_reader_counts_reads() {
        let reader = MockConfigReader::new().with_value("K", "V");
        assert_eq!(reader.read_optional("K").await, Ok(Some("V".to_string())));
        assert_eq!(reader.read_optional("missing").await, Ok(None));
        assert_eq!(reader.read_count(), 2);

        let failing = MockConfigReader::failing("sealed");
        assert!(failing.read_optional("K").await.is_err());
    }
}
