use std::time::{Duration, Instant};

/// The single live value held by a cache-aside decorator
///
/// Replaced whole on rebuild, so readers never see a value paired with
/// another value's metadata.
#[derive(Debug, Clone)]
pub struct CachedEntry<V, M> {
    value: V,
    created_at: Instant,
    metadata: M,
}

impl<V, M> CachedEntry<V, M> {
    pub fn new(value: V, created_at: Instant, metadata: M) -> Self {
        Self { value, created_at, metadata }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Age relative to `now`; zero if `now` is earlier than creation
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_saturates() {
        let created = Instant::now();
        let entry = CachedEntry::new("value", created + Duration::from_secs(5), ());

        assert_eq!(entry.age(created), Duration::ZERO);
        assert_eq!(entry.age(created + Duration::from_secs(8)), Duration::from_secs(3));
        assert_eq!(*entry.value(), "value");
    }
}
