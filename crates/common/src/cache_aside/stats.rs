//! Cache-aside statistics
//!
//! Each decorator counts how often it served the cached value, how often it
//! had to build, and why the previous value was dropped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters for one decorator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheAsideStats {
    /// Calls served from the cached value
    pub hits: u64,

    /// Calls that found no usable value
    pub misses: u64,

    /// Successful calls to the inner constructor
    pub builds: u64,

    /// Values dropped because they aged out or their claim expired
    pub expirations: u64,

    /// Values dropped because construction inputs changed
    pub invalidations: u64,

    /// Explicit flushes, including flushes of an empty cache
    pub flushes: u64,
}

impl CacheAsideStats {
    /// Calculate hit rate (hits / total accesses)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Lock-free counter set shared by a decorator's call paths
#[derive(Debug, Default)]
pub(crate) struct StatsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    expirations: AtomicU64,
    invalidations: AtomicU64,
    flushes: AtomicU64,
}

impl StatsCollector {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_build(&self) {
        self.builds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheAsideStats {
        CacheAsideStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }
}
