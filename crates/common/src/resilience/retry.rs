//! Named retry policies with bounded backoff
//!
//! A [`RetryPolicy`] wraps a "send once" operation. Only errors accepted by its
//! predicate (by default [`SendError::Transport`]) consume an attempt; any
//! other error leaves the loop immediately. When attempts run out, the last
//! error is returned unchanged.
//!
//! Policies are immutable once built and cheap to share behind an `Arc`.
//! [`RetryPolicyFactory`] is the seam the executor uses to build its lazily
//! created default policy.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ConstructionError, ConstructionResult};
use crate::http::SendError;

/// Attempts made by the default policy
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Base wait of the default policy, in seconds
pub const DEFAULT_WAIT_SECONDS: f64 = 0.25;
/// Name of the lazily built default policy
pub const DEFAULT_RETRY_POLICY_NAME: &str = "DefaultRetryPolicyName";
/// Upper bound for a single exponential backoff delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Mapping of policy name to a shared policy
pub type NamedRetryPolicies = HashMap<String, Arc<RetryPolicy>>;

/// Decides whether an error consumes a retry attempt
pub type RetryPredicate = fn(&SendError) -> bool;

/// Callback invoked before each retry
pub type RetryListener = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Default predicate: retry transport failures only
pub fn retry_on_transport_failure(error: &SendError) -> bool {
    error.is_transport_failure()
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Linear backoff: initial_delay + (retry_index * increment)
    Linear { initial_delay: Duration, increment: Duration },
    /// Exponential backoff: initial_delay * base^retry_index, capped at max_delay
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Doubling backoff starting at `initial_delay`
    pub fn exponential(initial_delay: Duration) -> Self {
        Self::Exponential { initial_delay, base: 2.0, max_delay: DEFAULT_MAX_DELAY }
    }

    /// Calculate the delay before retry number `retry_index` (0-based)
    pub fn calculate_delay(&self, retry_index: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(retry_index))
            }
            Self::Exponential { initial_delay, .. } if initial_delay.is_zero() => Duration::ZERO,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
                let secs = initial_delay.as_secs_f64() * base.powi(exponent);
                Duration::try_from_secs_f64(secs).map_or(*max_delay, |delay| delay.min(*max_delay))
            }
        }
    }

    fn validate(&self) -> ConstructionResult<()> {
        match self {
            Self::Exponential { base, .. } if !(base.is_finite() && *base > 0.0) => {
                Err(ConstructionError::retry("exponential base must be a positive number"))
            }
            _ => Ok(()),
        }
    }
}

/// Observable notification emitted before a retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryEvent {
    /// Number of the attempt about to run (1-based)
    pub attempt: u32,
    pub max_attempts: u32,
    pub policy_name: String,
    pub target_uri: Option<String>,
    /// Backoff waited before the attempt
    pub delay: Duration,
}

impl fmt::Display for RetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Retry attempt {} of {} (Retry.Name=\"{}\")",
            self.attempt, self.max_attempts, self.policy_name
        )?;
        if let Some(uri) = &self.target_uri {
            write!(f, " Uri=\"{uri}\"")?;
        }
        Ok(())
    }
}

/// Convert a base wait in seconds into a duration, rejecting nonsense input
pub fn wait_duration(wait_seconds: f64) -> ConstructionResult<Duration> {
    Duration::try_from_secs_f64(wait_seconds).map_err(|_| {
        ConstructionError::retry(format!(
            "wait_seconds must be a finite, non-negative number (got {wait_seconds})"
        ))
    })
}

/// An immutable, named retry decorator
#[derive(Clone)]
pub struct RetryPolicy {
    name: String,
    max_attempts: u32,
    backoff: BackoffStrategy,
    retry_if: RetryPredicate,
    listener: Option<RetryListener>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("name", &self.name)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Exponential policy retrying transport failures
    ///
    /// # Errors
    /// Returns `ConstructionError` for zero attempts, a negative or non-finite
    /// wait, or an empty name.
    pub fn new(
        name: impl Into<String>,
        max_attempts: u32,
        wait_seconds: f64,
    ) -> ConstructionResult<Self> {
        Self::builder(name)
            .max_attempts(max_attempts)
            .backoff(BackoffStrategy::exponential(wait_duration(wait_seconds)?))
            .build()
    }

    pub fn builder(name: impl Into<String>) -> RetryPolicyBuilder {
        RetryPolicyBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &BackoffStrategy {
        &self.backoff
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts
    pub async fn execute<F, Fut, T>(
        &self,
        target_uri: Option<&str>,
        mut operation: F,
    ) -> Result<T, SendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SendError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                policy = %self.name,
                attempt,
                max_attempts = self.max_attempts,
                "Executing operation"
            );

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(policy = %self.name, attempt, "Operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !(self.retry_if)(&error) {
                debug!(policy = %self.name, %error, "Error is not retryable");
                return Err(error);
            }

            if attempt >= self.max_attempts {
                warn!(
                    policy = %self.name,
                    attempts = attempt,
                    %error,
                    "All retry attempts exhausted"
                );
                return Err(error);
            }

            let delay = self.backoff.calculate_delay(attempt - 1);
            let event = RetryEvent {
                attempt: attempt + 1,
                max_attempts: self.max_attempts,
                policy_name: self.name.clone(),
                target_uri: target_uri.map(str::to_owned),
                delay,
            };
            warn!(%error, ?delay, "{event}");
            if let Some(listener) = &self.listener {
                listener(&event);
            }

            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`RetryPolicy`]
pub struct RetryPolicyBuilder {
    name: String,
    max_attempts: u32,
    backoff: BackoffStrategy,
    retry_if: RetryPredicate,
    listener: Option<RetryListener>,
}

impl RetryPolicyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffStrategy::exponential(Duration::from_millis(250)),
            retry_if: retry_on_transport_failure,
            listener: None,
        }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn fixed_backoff(self, delay: Duration) -> Self {
        self.backoff(BackoffStrategy::Fixed(delay))
    }

    pub fn linear_backoff(self, initial_delay: Duration, increment: Duration) -> Self {
        self.backoff(BackoffStrategy::Linear { initial_delay, increment })
    }

    pub fn exponential_backoff(
        self,
        initial_delay: Duration,
        base: f64,
        max_delay: Duration,
    ) -> Self {
        self.backoff(BackoffStrategy::Exponential { initial_delay, base, max_delay })
    }

    /// Replace the predicate deciding which errors consume an attempt
    pub fn retry_if(mut self, predicate: RetryPredicate) -> Self {
        self.retry_if = predicate;
        self
    }

    pub fn listener(mut self, listener: RetryListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn build(self) -> ConstructionResult<RetryPolicy> {
        if self.name.trim().is_empty() {
            return Err(ConstructionError::retry("policy name must be non-empty"));
        }
        if self.max_attempts == 0 {
            return Err(ConstructionError::retry("max_attempts must be greater than 0"));
        }
        self.backoff.validate()?;

        Ok(RetryPolicy {
            name: self.name,
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            retry_if: self.retry_if,
            listener: self.listener,
        })
    }
}

/// Builds retry policies from scalar tuning values
pub trait RetryPolicyFactory: Send + Sync + fmt::Debug {
    /// Build an exponential policy retrying transport failures
    ///
    /// # Errors
    /// Returns `ConstructionError` when the inputs are out of range.
    fn build(
        &self,
        max_attempts: u32,
        wait_seconds: f64,
        policy_name: &str,
    ) -> ConstructionResult<RetryPolicy>;
}

/// Factory producing doubling backoff capped at a maximum delay
#[derive(Clone)]
pub struct DefaultRetryPolicyFactory {
    max_delay: Duration,
    listener: Option<RetryListener>,
}

impl Default for DefaultRetryPolicyFactory {
    fn default() -> Self {
        Self { max_delay: DEFAULT_MAX_DELAY, listener: None }
    }
}

impl fmt::Debug for DefaultRetryPolicyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRetryPolicyFactory")
            .field("max_delay", &self.max_delay)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl DefaultRetryPolicyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Attach a listener to every policy this factory builds
    #[must_use]
    pub fn with_listener(mut self, listener: RetryListener) -> Self {
        self.listener = Some(listener);
        self
    }
}

impl RetryPolicyFactory for DefaultRetryPolicyFactory {
    fn build(
        &self,
        max_attempts: u32,
        wait_seconds: f64,
        policy_name: &str,
    ) -> ConstructionResult<RetryPolicy> {
        let mut builder = RetryPolicy::builder(policy_name)
            .max_attempts(max_attempts)
            .exponential_backoff(wait_duration(wait_seconds)?, 2.0, self.max_delay);
        if let Some(listener) = &self.listener {
            builder = builder.listener(Arc::clone(listener));
        }

        let policy = builder.build()?;
        debug!(
            policy = %policy.name(),
            max_attempts,
            wait_seconds,
            "Built retry policy"
        );
        Ok(policy)
    }
}
