//! Resilient request execution and cache-aside decorators shared across
//! Steadfast crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors, HTTP value types, the failed-response snapshot
//! - `runtime`: validator, retry policies, executor, cache-aside decorators,
//!   configuration seam (default)
//! - `test-utils`: mocks and fixtures for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod http;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache_aside;
#[cfg(feature = "runtime")]
pub mod config;
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache_aside::{
    CacheAsideError, CacheAsideStats, FlushCacheAside, HandleCacheAside, HandleCreator,
    HandleParameters, LoadOnceCacheAside, TokenCacheAside, TokenProvider, ValueLoader,
};
#[cfg(feature = "runtime")]
pub use config::{ConfigError, ConfigReader, EnvConfigReader, StaticConfigReader};
#[cfg(feature = "foundation")]
pub use error::{
    BoxedError, ConstructionError, ConstructionResult, ErrorClassification, ErrorSeverity,
};
#[cfg(feature = "runtime")]
pub use http::{
    DefaultResponseValidator, ResilientHttpClient, ResilientRequestExecutor, ResponseValidator,
    Transport,
};
#[cfg(feature = "foundation")]
pub use http::{
    FailedResponseSnapshot, HttpMethod, HttpRequest, HttpResponse, SendError,
    TransportFailureError,
};
#[cfg(feature = "runtime")]
pub use resilience::{
    BackoffStrategy, Clock, DefaultRetryPolicyFactory, MockClock, NamedRetryPolicies,
    RetryEvent, RetryPolicy, RetryPolicyFactory, SystemClock,
};
