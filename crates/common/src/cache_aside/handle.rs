//! TTL-and-parameter cache for client handles
//!
//! A cached handle is reused only while it is younger than the TTL *and* was
//! built from parameters with the same [`Fingerprint`]. Age is measured from
//! the moment the rebuild started, not when the inner creator returned.
//!
//! The TTL is read once from the optional [`ConfigReader`] under
//! [`HANDLE_CACHE_TTL_SECONDS_KEY`] and cached for the decorator's lifetime.
//! A missing reader, an unset key, an unparsable value or a failed read all
//! fall back to [`DEFAULT_HANDLE_CACHE_TTL_SECONDS`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use super::entry::CachedEntry;
use super::stats::{CacheAsideStats, StatsCollector};
use super::{CacheAsideError, FlushCacheAside};
use crate::config::{
    ConfigReader, DEFAULT_HANDLE_CACHE_TTL_SECONDS, HANDLE_CACHE_TTL_SECONDS_KEY,
};
use crate::resilience::clock::{Clock, SystemClock};

/// Binding choice used when none is given
pub const DEFAULT_BINDING_CHOICE: &str = "any";

/// Coarse summary of construction inputs used to detect changes
pub trait Fingerprint {
    type Key: PartialEq + fmt::Debug + Send + Sync + 'static;

    fn fingerprint(&self) -> Self::Key;
}

/// Construction inputs of a handle
///
/// Bindings and the output schema are shared through `Arc` so that their
/// identity, not their contents, decides whether inputs changed. Mutating a
/// binding in place is therefore not detected.
#[derive(Debug)]
pub struct HandleParameters<B> {
    bindings: Option<Vec<Arc<B>>>,
    binding_choice: String,
    structured_output: bool,
    output_schema: Option<Arc<serde_json::Value>>,
}

impl<B> Clone for HandleParameters<B> {
    fn clone(&self) -> Self {
        Self {
            bindings: self.bindings.clone(),
            binding_choice: self.binding_choice.clone(),
            structured_output: self.structured_output,
            output_schema: self.output_schema.clone(),
        }
    }
}

impl<B> Default for HandleParameters<B> {
    fn default() -> Self {
        Self {
            bindings: None,
            binding_choice: DEFAULT_BINDING_CHOICE.to_string(),
            structured_output: false,
            output_schema: None,
        }
    }
}

impl<B> HandleParameters<B> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: Vec<Arc<B>>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    #[must_use]
    pub fn with_binding_choice(mut self, choice: impl Into<String>) -> Self {
        self.binding_choice = choice.into();
        self
    }

    #[must_use]
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    #[must_use]
    pub fn with_output_schema(mut self, schema: Arc<serde_json::Value>) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn bindings(&self) -> Option<&[Arc<B>]> {
        self.bindings.as_deref()
    }

    pub fn binding_choice(&self) -> &str {
        &self.binding_choice
    }

    pub fn structured_output(&self) -> bool {
        self.structured_output
    }

    pub fn output_schema(&self) -> Option<&Arc<serde_json::Value>> {
        self.output_schema.as_ref()
    }
}

/// Identity-based fingerprint of [`HandleParameters`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterFingerprint {
    binding_count: Option<usize>,
    binding_ids: Vec<usize>,
    binding_choice: String,
    structured_output: bool,
    output_schema_id: Option<usize>,
}

fn identity<T: ?Sized>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value).cast::<()>() as usize
}

impl<B> Fingerprint for HandleParameters<B> {
    type Key = ParameterFingerprint;

    fn fingerprint(&self) -> ParameterFingerprint {
        ParameterFingerprint {
            binding_count: self.bindings.as_ref().map(Vec::len),
            binding_ids: self.bindings.iter().flatten().map(identity).collect(),
            binding_choice: self.binding_choice.clone(),
            structured_output: self.structured_output,
            output_schema_id: self.output_schema.as_ref().map(identity),
        }
    }
}

/// Builds a handle from construction parameters
#[async_trait]
pub trait HandleCreator<P, H>: Send + Sync {
    async fn create_handle(&self, parameters: &P) -> Result<H, CacheAsideError>;
}

/// Resolve the handle cache TTL from an optional configuration reader
pub async fn resolve_ttl(reader: Option<&dyn ConfigReader>) -> Duration {
    let default = Duration::from_secs(DEFAULT_HANDLE_CACHE_TTL_SECONDS);
    let Some(reader) = reader else {
        return default;
    };

    match reader.read_optional(HANDLE_CACHE_TTL_SECONDS_KEY).await {
        // Zero or negative TTLs disable caching
        Ok(Some(raw)) => match raw.trim().parse::<i64>() {
            Ok(secs) => Duration::from_secs(u64::try_from(secs).unwrap_or(0)),
            Err(_) => {
                warn!(
                    key = HANDLE_CACHE_TTL_SECONDS_KEY,
                    value = %raw,
                    "Unparsable handle cache TTL, using default"
                );
                default
            }
        },
        Ok(None) => default,
        Err(error) => {
            warn!(key = HANDLE_CACHE_TTL_SECONDS_KEY, %error, "Failed to read handle cache TTL");
            default
        }
    }
}

/// Handle creator decorator with TTL and parameter-change invalidation
pub struct HandleCacheAside<P: Fingerprint, H> {
    inner: Box<dyn HandleCreator<P, H>>,
    config_reader: Option<Arc<dyn ConfigReader>>,
    ttl: OnceCell<Duration>,
    clock: Arc<dyn Clock>,
    entry: Mutex<Option<CachedEntry<H, P::Key>>>,
    stats: StatsCollector,
}

impl<P: Fingerprint, H> fmt::Debug for HandleCacheAside<P, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleCacheAside")
            .field("ttl", &self.ttl.get())
            .field("has_config_reader", &self.config_reader.is_some())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl<P, H> HandleCacheAside<P, H>
where
    P: Fingerprint + Send + Sync + 'static,
    H: Clone + Send + Sync + 'static,
{
    pub fn new(
        inner: Box<dyn HandleCreator<P, H>>,
        config_reader: Option<Arc<dyn ConfigReader>>,
    ) -> Self {
        Self::with_clock(inner, config_reader, Arc::new(SystemClock))
    }

    pub fn with_clock(
        inner: Box<dyn HandleCreator<P, H>>,
        config_reader: Option<Arc<dyn ConfigReader>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            config_reader,
            ttl: OnceCell::new(),
            clock,
            entry: Mutex::new(None),
            stats: StatsCollector::default(),
        }
    }

    /// TTL in effect; resolved on first use
    pub async fn ttl(&self) -> Duration {
        *self.ttl.get_or_init(|| resolve_ttl(self.config_reader.as_deref())).await
    }

    pub fn stats(&self) -> CacheAsideStats {
        self.stats.snapshot()
    }
}

#[async_trait]
impl<P, H> HandleCreator<P, H> for HandleCacheAside<P, H>
where
    P: Fingerprint + Send + Sync + 'static,
    H: Clone + Send + Sync + 'static,
{
    async fn create_handle(&self, parameters: &P) -> Result<H, CacheAsideError> {
        let ttl = self.ttl().await;
        let fingerprint = parameters.fingerprint();
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            let age = cached.age(self.clock.now());
            if age >= ttl {
                info!(?age, ?ttl, "Cached handle aged out");
                self.stats.record_expiration();
            } else if *cached.metadata() != fingerprint {
                info!("Handle parameters changed, rebuilding");
                self.stats.record_invalidation();
            } else {
                self.stats.record_hit();
                return Ok(cached.value().clone());
            }
        }
        *entry = None;
        self.stats.record_miss();

        let created_at = self.clock.now();
        let handle = self.inner.create_handle(parameters).await.map_err(|error| {
            warn!(%error, "Handle creator failed");
            error
        })?;
        *entry = Some(CachedEntry::new(handle.clone(), created_at, fingerprint));
        self.stats.record_build();
        debug!(?ttl, "Cached new handle");

        Ok(handle)
    }
}

#[async_trait]
impl<P, H> FlushCacheAside for HandleCacheAside<P, H>
where
    P: Fingerprint + Send + Sync + 'static,
    H: Clone + Send + Sync + 'static,
{
    async fn flush_cache_aside(&self) {
        self.entry.lock().await.take();
        self.stats.record_flush();
        debug!("Flushed cached handle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticConfigReader;
    use crate::resilience::clock::MockClock;
    use crate::testing::mocks::{MockConfigReader, MockHandleCreator};

    type Params = HandleParameters<String>;

    #[test]
    fn test_default_parameters() {
        let params = Params::new();
        assert_eq!(params.binding_choice(), "any");
        assert!(!params.structured_output());
        assert!(params.bindings().is_none());
        assert!(params.output_schema().is_none());
    }

    /// Validates fingerprints follow identity, not contents.
    ///
    /// Assertions:
    /// - Clones sharing the same `Arc`s have equal fingerprints.
    /// - Equal contents in a new `Arc` produce a different fingerprint.
    /// - A changed scalar flag produces a different fingerprint.
    #[test]
    fn test_fingerprint_uses_identity() {
        let binding = Arc::new("search".to_string());
        let params = Params::new().with_bindings(vec![Arc::clone(&binding)]);

        assert_eq!(params.fingerprint(), params.clone().fingerprint());

        let same_contents = Params::new().with_bindings(vec![Arc::new("search".to_string())]);
        assert_ne!(params.fingerprint(), same_contents.fingerprint());

        let flagged = params.clone().with_structured_output(true);
        assert_ne!(params.fingerprint(), flagged.fingerprint());

        assert_ne!(Params::new().fingerprint(), Params::new().with_bindings(vec![]).fingerprint());
    }

    /// Validates TTL resolution falls back to the default on every failure.
    ///
    /// Assertions:
    /// - No reader, unset key, garbage value and a failing reader give 3500s.
    /// - A negative value resolves to a zero TTL.
    /// - A numeric value with whitespace is honoured.
    #[tokio::test]
    async fn test_resolve_ttl_fallbacks() {
        let default = Duration::from_secs(3500);
        assert_eq!(resolve_ttl(None).await, default);

        let unset = StaticConfigReader::new();
        assert_eq!(resolve_ttl(Some(&unset)).await, default);

        let garbage = StaticConfigReader::new().with_value(HANDLE_CACHE_TTL_SECONDS_KEY, "soon");
        assert_eq!(resolve_ttl(Some(&garbage)).await, default);

        let negative = StaticConfigReader::new().with_value(HANDLE_CACHE_TTL_SECONDS_KEY, "-5");
        assert_eq!(resolve_ttl(Some(&negative)).await, Duration::ZERO);

        let failing = MockConfigReader::failing("vault sealed");
        assert_eq!(resolve_ttl(Some(&failing)).await, default);

        let custom = StaticConfigReader::new().with_value(HANDLE_CACHE_TTL_SECONDS_KEY, " 60 ");
        assert_eq!(resolve_ttl(Some(&custom)).await, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_ttl_is_read_once() {
        let reader = MockConfigReader::new().with_value(HANDLE_CACHE_TTL_SECONDS_KEY, "10");
        let cache: HandleCacheAside<Params, String> = HandleCacheAside::new(
            Box::new(MockHandleCreator::new()),
            Some(Arc::new(reader.clone())),
        );

        assert_eq!(cache.ttl().await, Duration::from_secs(10));
        assert_eq!(cache.ttl().await, Duration::from_secs(10));
        assert_eq!(reader.read_count(), 1);
    }

    /// Validates a non-positive TTL rebuilds on every call.
    ///
    /// Assertions:
    /// - Three calls with unchanged parameters reach the creator three times.
    /// - Every call after the first counts as an expiration.
    #[tokio::test]
    async fn test_negative_ttl_always_rebuilds() {
        let reader = StaticConfigReader::new().with_value(HANDLE_CACHE_TTL_SECONDS_KEY, "-5");
        let creator = MockHandleCreator::new();
        let cache = HandleCacheAside::with_clock(
            Box::new(creator.clone()),
            Some(Arc::new(reader)),
            Arc::new(MockClock::new()),
        );
        let params = Params::new();

        for _ in 0..3 {
            cache.create_handle(&params).await.unwrap();
        }

        assert_eq!(creator.call_count(), 3);
        assert_eq!(cache.stats().expirations, 2);
    }

    /// Validates age is measured from the start of the rebuild.
    ///
    /// Assertions:
    /// - A creator that takes 4s of a 10s TTL leaves 6s of validity.
    #[tokio::test]
    async fn test_age_counts_from_rebuild_start() {
        let clock = MockClock::new();
        let reader = StaticConfigReader::new().with_value(HANDLE_CACHE_TTL_SECONDS_KEY, "10");
        let creator = MockHandleCreator::new().advancing(clock.clone(), Duration::from_secs(4));
        let cache = HandleCacheAside::with_clock(
            Box::new(creator.clone()),
            Some(Arc::new(reader)),
            Arc::new(clock.clone()),
        );
        let params = Params::new();

        cache.create_handle(&params).await.unwrap();
        clock.advance(Duration::from_secs(5));
        cache.create_handle(&params).await.unwrap();
        assert_eq!(creator.call_count(), 1);

        clock.advance(Duration::from_secs(1));
        cache.create_handle(&params).await.unwrap();
        assert_eq!(creator.call_count(), 2);
        assert_eq!(cache.stats().expirations, 1);
    }
}
