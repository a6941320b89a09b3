//! Expiry-claim cache for bearer tokens
//!
//! The cached token is trusted until its `exp` claim lies strictly in the
//! past. The claim is read from the base64url payload segment without
//! verifying the signature.
//!
//! A token without an `exp` claim (or with `exp == 0`) keeps being served
//! until it is flushed. Tokens whose payload cannot be decoded are treated the
//! same way. There is no independent TTL.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::entry::CachedEntry;
use super::stats::{CacheAsideStats, StatsCollector};
use super::{CacheAsideError, FlushCacheAside};
use crate::resilience::clock::{Clock, SystemClock};

/// Produces a bearer token
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, CacheAsideError>;
}

/// Outcome of reading the `exp` claim of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryClaim {
    Expires(DateTime<Utc>),
    /// No claim, or a claim of zero
    Absent,
    /// The token is not a readable JWT
    Undecodable,
}

impl ExpiryClaim {
    /// True only for a claim strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self, Self::Expires(expires_at) if *expires_at < now)
    }
}

/// Read the `exp` claim from a JWT-shaped token
pub fn decode_expiry_claim(token: &str) -> ExpiryClaim {
    let Some(payload) = token.split('.').nth(1) else {
        return ExpiryClaim::Undecodable;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload.trim().trim_end_matches('=')) else {
        return ExpiryClaim::Undecodable;
    };
    let Ok(Value::Object(claims)) = serde_json::from_slice::<Value>(&bytes) else {
        return ExpiryClaim::Undecodable;
    };

    match claims.get("exp") {
        None | Some(Value::Null) => ExpiryClaim::Absent,
        Some(exp) => match exp.as_f64() {
            Some(secs) if secs == 0.0 => ExpiryClaim::Absent,
            Some(secs) => DateTime::from_timestamp_millis((secs * 1000.0) as i64)
                .map_or(ExpiryClaim::Undecodable, ExpiryClaim::Expires),
            None => ExpiryClaim::Undecodable,
        },
    }
}

/// Token provider decorator honouring the token's own expiry claim
pub struct TokenCacheAside {
    inner: Box<dyn TokenProvider>,
    clock: Arc<dyn Clock>,
    entry: Mutex<Option<CachedEntry<String, ExpiryClaim>>>,
    stats: StatsCollector,
}

impl fmt::Debug for TokenCacheAside {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCacheAside")
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl TokenCacheAside {
    pub fn new(inner: Box<dyn TokenProvider>) -> Self {
        Self::with_clock(inner, Arc::new(SystemClock))
    }

    pub fn with_clock(inner: Box<dyn TokenProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { inner, clock, entry: Mutex::new(None), stats: StatsCollector::default() }
    }

    pub fn stats(&self) -> CacheAsideStats {
        self.stats.snapshot()
    }
}

#[async_trait]
impl TokenProvider for TokenCacheAside {
    async fn get_token(&self) -> Result<String, CacheAsideError> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            let now = DateTime::<Utc>::from(self.clock.system_time());
            let claim = *cached.metadata();
            if !claim.is_expired_at(now) {
                if !matches!(claim, ExpiryClaim::Expires(_)) {
                    debug!(?claim, "Serving cached token without a usable exp claim");
                }
                self.stats.record_hit();
                return Ok(cached.value().clone());
            }
            info!(?claim, "Cached token expired");
            self.stats.record_expiration();
        }
        *entry = None;
        self.stats.record_miss();

        let token = self.inner.get_token().await.map_err(|error| {
            warn!(%error, "Token provider failed");
            error
        })?;
        let claim = decode_expiry_claim(&token);
        *entry = Some(CachedEntry::new(token.clone(), self.clock.now(), claim));
        self.stats.record_build();
        debug!(?claim, "Cached new token");

        Ok(token)
    }
}

#[async_trait]
impl FlushCacheAside for TokenCacheAside {
    async fn flush_cache_aside(&self) {
        self.entry.lock().await.take();
        self.stats.record_flush();
        debug!("Flushed cached token");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::clock::MockClock;
    use crate::testing::fixtures::{jwt_expiring_at, unsigned_jwt};
    use crate::testing::mocks::MockTokenProvider;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_decode_expiry_claim() {
        let expiring = jwt_expiring_at(NOW);
        assert_eq!(
            decode_expiry_claim(&expiring),
            ExpiryClaim::Expires(DateTime::from_timestamp(NOW, 0).unwrap())
        );
        assert_eq!(
            decode_expiry_claim(&unsigned_jwt(&serde_json::json!({"sub": "svc"}))),
            ExpiryClaim::Absent
        );
        assert_eq!(
            decode_expiry_claim(&unsigned_jwt(&serde_json::json!({"exp": 0}))),
            ExpiryClaim::Absent
        );
        assert_eq!(decode_expiry_claim("opaque-token"), ExpiryClaim::Undecodable);
        assert_eq!(decode_expiry_claim("a.!!!.c"), ExpiryClaim::Undecodable);
    }

    #[test]
    fn test_claim_expiry_is_strict() {
        let at = DateTime::from_timestamp(NOW, 0).unwrap();
        let claim = ExpiryClaim::Expires(at);

        assert!(!claim.is_expired_at(at));
        assert!(claim.is_expired_at(DateTime::from_timestamp(NOW + 1, 0).unwrap()));
        assert!(!ExpiryClaim::Absent.is_expired_at(at));
        assert!(!ExpiryClaim::Undecodable.is_expired_at(at));
    }

    /// Validates an expired token is rebuilt on the next call.
    ///
    /// Assertions:
    /// - The second call returns the second token.
    /// - The provider was called twice and one expiration was recorded.
    #[tokio::test]
    async fn test_expired_token_is_rebuilt() {
        let clock = MockClock::at_epoch_secs(NOW as u64);
        let stale = jwt_expiring_at(NOW - 10);
        let fresh = jwt_expiring_at(NOW + 3600);
        let provider = MockTokenProvider::with_tokens([stale.clone(), fresh.clone()]);
        let cache = TokenCacheAside::with_clock(Box::new(provider.clone()), Arc::new(clock));

        assert_eq!(cache.get_token().await.unwrap(), stale);
        assert_eq!(cache.get_token().await.unwrap(), fresh);
        assert_eq!(cache.get_token().await.unwrap(), fresh);

        assert_eq!(provider.call_count(), 2);
        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_cache_empty() {
        let provider = MockTokenProvider::new();
        provider.push_failure("identity endpoint unavailable");
        provider.push_token(jwt_expiring_at(i64::from(u32::MAX)));
        let cache = TokenCacheAside::new(Box::new(provider.clone()));

        assert!(matches!(cache.get_token().await, Err(CacheAsideError::Construction(_))));
        assert!(cache.get_token().await.is_ok());
        assert_eq!(provider.call_count(), 2);
    }
}
