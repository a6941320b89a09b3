//! Resilience patterns for outbound calls
//!
//! - **Retry**: named, immutable [`RetryPolicy`] values with fixed, linear or
//!   exponential backoff, built directly or through a [`RetryPolicyFactory`].
//! - **Clock**: the time abstraction used by the cache-aside decorators so
//!   expiry and TTL checks can be tested without sleeping.

pub mod clock;
pub mod retry;

pub use clock::{Clock, MockClock, SystemClock};
pub use retry::{
    retry_on_transport_failure, wait_duration, BackoffStrategy, DefaultRetryPolicyFactory,
    NamedRetryPolicies, RetryEvent, RetryListener, RetryPolicy, RetryPolicyBuilder,
    RetryPolicyFactory, RetryPredicate, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    DEFAULT_RETRY_POLICY_NAME, DEFAULT_WAIT_SECONDS,
};
