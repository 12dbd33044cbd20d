//! Lifetime and invalidation fan-out of a cached query result.

use std::time::Duration;

/// How long an entry lives and how many invalidation buckets it joins.
///
/// Buckets are derived from the entry key (see [`CachingKey::buckets`]); a
/// count of zero means the entry can only be removed by key or by expiry.
///
/// [`CachingKey::buckets`]: super::CachingKey::buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    ttl: Duration,
    bucket_count: usize,
}

impl CachePolicy {
    pub const fn new(ttl: Duration, bucket_count: usize) -> Self {
        Self { ttl, bucket_count }
    }

    pub const fn minutes(minutes: u64, bucket_count: usize) -> Self {
        Self::new(Duration::from_secs(minutes * 60), bucket_count)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Entries with a zero TTL would be dead on arrival and are never stored.
    pub fn is_cacheable(&self) -> bool {
        !self.ttl.is_zero()
    }
}
