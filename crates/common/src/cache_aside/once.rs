//! Load-once cache for values that never expire
//!
//! Configuration holders and similar values are hydrated on the first call
//! and then served until flushed. A loader that returns `None` is an error,
//! and nothing is cached.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::stats::{CacheAsideStats, StatsCollector};
use super::{CacheAsideError, FlushCacheAside};

/// Loads a value that may legitimately be absent at the source
#[async_trait]
pub trait ValueLoader<V>: Send + Sync {
    async fn load(&self) -> Result<Option<V>, CacheAsideError>;
}

pub struct LoadOnceCacheAside<V> {
    inner: Box<dyn ValueLoader<V>>,
    what: &'static str,
    value: Mutex<Option<V>>,
    stats: StatsCollector,
}

impl<V> fmt::Debug for LoadOnceCacheAside<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOnceCacheAside")
            .field("what", &self.what)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl<V> LoadOnceCacheAside<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// `what` names the value in logs and in [`CacheAsideError::MissingValue`]
    pub fn new(inner: Box<dyn ValueLoader<V>>, what: &'static str) -> Self {
        Self { inner, what, value: Mutex::new(None), stats: StatsCollector::default() }
    }

    /// Return the cached value, loading it on first use
    ///
    /// # Errors
    /// Propagates loader failures and returns
    /// [`CacheAsideError::MissingValue`] if the loader produced nothing.
    pub async fn get(&self) -> Result<V, CacheAsideError> {
        let mut value = self.value.lock().await;
        if let Some(cached) = value.as_ref() {
            self.stats.record_hit();
            return Ok(cached.clone());
        }
        self.stats.record_miss();

        let Some(loaded) = self.inner.load().await? else {
            warn!(what = self.what, "Loader returned no value");
            return Err(CacheAsideError::MissingValue { what: self.what });
        };
        *value = Some(loaded.clone());
        self.stats.record_build();
        debug!(what = self.what, "Hydrated load-once cache");
        Ok(loaded)
    }

    pub fn stats(&self) -> CacheAsideStats {
        self.stats.snapshot()
    }
}

#[async_trait]
impl<V> ValueLoader<V> for LoadOnceCacheAside<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Option<V>, CacheAsideError> {
        self.get().await.map(Some)
    }
}

#[async_trait]
impl<V> FlushCacheAside for LoadOnceCacheAside<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn flush_cache_aside(&self) {
        self.value.lock().await.take();
        self.stats.record_flush();
        debug!(what = self.what, "Flushed load-once cache");
    }
}
