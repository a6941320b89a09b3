//! Cache-aside decorators for expensive-to-construct values
//!
//! Each decorator implements the same trait as the component it wraps, owns
//! a boxed inner instance, and forwards to it only when its cached value is
//! missing or no longer valid:
//!
//! | Decorator | Wraps | Invalidation |
//! |-----------|-------|--------------|
//! | [`TokenCacheAside`] | [`TokenProvider`] | `exp` claim of the cached token is in the past |
//! | [`HandleCacheAside`] | [`HandleCreator`] | age reaches the TTL, or the parameter fingerprint changes |
//! | [`LoadOnceCacheAside`] | [`ValueLoader`] | never (flush only) |
//!
//! All decorators hold at most one live [`CachedEntry`] and serialize the
//! check-rebuild-store sequence behind an async mutex, so concurrent callers
//! on one instance trigger at most one rebuild. A failed rebuild leaves the
//! cache empty.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{BoxedError, ErrorClassification, ErrorSeverity};

pub mod entry;
pub mod handle;
pub mod once;
pub mod stats;
pub mod token;

pub use entry::CachedEntry;
pub use handle::{
    resolve_ttl, Fingerprint, HandleCacheAside, HandleCreator, HandleParameters,
    ParameterFingerprint, DEFAULT_BINDING_CHOICE,
};
pub use once::{LoadOnceCacheAside, ValueLoader};
pub use stats::CacheAsideStats;
pub use token::{decode_expiry_claim, ExpiryClaim, TokenCacheAside, TokenProvider};

/// Errors surfaced by cache-aside decorators and the components they wrap
#[derive(Debug, Error)]
pub enum CacheAsideError {
    /// The inner constructor failed
    #[error("Failed to construct cached value: {0}")]
    Construction(#[source] BoxedError),

    /// A load-once loader produced nothing
    #[error("{what} loader returned no value")]
    MissingValue { what: &'static str },
}

impl CacheAsideError {
    /// Wrap a constructor failure
    pub fn construction(error: impl Into<BoxedError>) -> Self {
        Self::Construction(error.into())
    }
}

impl ErrorClassification for CacheAsideError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

/// Drop the cached value so the next call rebuilds it
#[async_trait]
pub trait FlushCacheAside: Send + Sync {
    /// Clear the cache unconditionally; flushing an empty cache is a no-op
    async fn flush_cache_aside(&self);
}
