//! Process-wide query cache.
//!
//! Entries carry an expiry instant and belong to zero or more invalidation
//! buckets. Payloads are type-erased so any cloneable query output can be
//! stored without a serialization round trip.

use std::any::Any;
use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::{counter, gauge};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::keys::CachingKey;
use super::lock::{rw_read, rw_write};
use super::policy::CachePolicy;
use super::registry::BucketRegistry;

const METRIC_CACHE_HIT: &str = "quorum_cache_hit_total";
const METRIC_CACHE_MISS: &str = "quorum_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "quorum_cache_evict_total";
const METRIC_CACHE_INVALIDATE: &str = "quorum_cache_invalidate_total";
const METRIC_CACHE_ENTRIES: &str = "quorum_cache_entries";

type Payload = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    value: Payload,
    /// `None` when the TTL is too large to represent; such entries only leave
    /// by eviction or invalidation.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

struct Inner {
    entries: LruCache<String, CacheEntry>,
    buckets: BucketRegistry,
}

impl Inner {
    fn discard(&mut self, key: &str) -> bool {
        self.buckets.unregister(key);
        self.entries.pop(key).is_some()
    }
}

/// Shared cache store.
///
/// Built once at startup and handed to queries and commands as
/// `Arc<CacheHandler>`. All operations are synchronous and short; a single
/// lock guards entries and bucket memberships together.
pub struct CacheHandler {
    config: CacheConfig,
    inner: RwLock<Inner>,
}

impl CacheHandler {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = config.max_entries_non_zero();
        Self {
            config,
            inner: RwLock::new(Inner {
                entries: LruCache::new(capacity),
                buckets: BucketRegistry::new(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// True iff a live entry is stored under `key`.
    pub fn exists(&self, key: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        let now = Instant::now();
        rw_read(&self.inner, "exists")
            .entries
            .peek(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Returns the live payload under `key`.
    ///
    /// Expired entries are dropped on sight. A payload of another type than
    /// `T` is reported as absent.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.config.enabled {
            return None;
        }

        let now = Instant::now();
        let payload = {
            let mut inner = rw_write(&self.inner, "get");
            let lookup = inner
                .entries
                .get(key)
                .map(|entry| (entry.is_live(now), Arc::clone(&entry.value)));
            match lookup {
                Some((true, payload)) => Some(payload),
                Some((false, _)) => {
                    inner.discard(key);
                    gauge!(METRIC_CACHE_ENTRIES).set(inner.entries.len() as f64);
                    debug!(key, "Cache entry expired");
                    None
                }
                None => None,
            }
        };

        let Some(payload) = payload else {
            counter!(METRIC_CACHE_MISS).increment(1);
            return None;
        };

        match payload.downcast_ref::<T>() {
            Some(value) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(value.clone())
            }
            None => {
                warn!(
                    key,
                    expected = std::any::type_name::<T>(),
                    "Cached payload has unexpected type; treating as miss"
                );
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    /// Stores `value` under `key`, replacing any previous entry and its
    /// bucket memberships.
    pub fn set<T>(&self, key: impl Into<String>, value: T, policy: CachePolicy)
    where
        T: Send + Sync + 'static,
    {
        if !self.config.enabled || !policy.is_cacheable() {
            return;
        }

        let key = key.into();
        let buckets = CachingKey::buckets(&key, policy.bucket_count());
        let entry = CacheEntry {
            value: Arc::new(value),
            expires_at: Instant::now().checked_add(policy.ttl()),
        };

        let mut inner = rw_write(&self.inner, "set");
        inner.buckets.unregister(&key);
        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry)
            && evicted != key
        {
            inner.buckets.unregister(&evicted);
            counter!(METRIC_CACHE_EVICT).increment(1);
            debug!(key = %evicted, "Cache entry evicted for capacity");
        }
        inner.buckets.register(&key, buckets);
        gauge!(METRIC_CACHE_ENTRIES).set(inner.entries.len() as f64);
    }

    /// Drops the entry under `key`. Returns whether one was stored.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = rw_write(&self.inner, "remove");
        let removed = inner.discard(key);
        if removed {
            counter!(METRIC_CACHE_INVALIDATE, "scope" => "key").increment(1);
            gauge!(METRIC_CACHE_ENTRIES).set(inner.entries.len() as f64);
        }
        removed
    }

    /// Drops every entry belonging to `bucket`. Returns how many were removed.
    pub fn invalidate_bucket(&self, bucket: &str) -> usize {
        let mut inner = rw_write(&self.inner, "invalidate_bucket");
        let keys = inner.buckets.take_bucket(bucket);
        let mut removed = 0;
        for key in &keys {
            if inner.entries.pop(key.as_str()).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            counter!(METRIC_CACHE_INVALIDATE, "scope" => "bucket").increment(removed as u64);
            gauge!(METRIC_CACHE_ENTRIES).set(inner.entries.len() as f64);
        }
        debug!(bucket, removed, "Cache bucket invalidated");
        removed
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = rw_write(&self.inner, "purge_expired");
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.discard(key);
        }
        gauge!(METRIC_CACHE_ENTRIES).set(inner.entries.len() as f64);
        expired.len()
    }

    pub fn clear(&self) {
        let mut inner = rw_write(&self.inner, "clear");
        inner.entries.clear();
        inner.buckets.clear();
        gauge!(METRIC_CACHE_ENTRIES).set(0.0);
    }

    /// Number of stored entries, expired ones not yet purged included.
    pub fn len(&self) -> usize {
        rw_read(&self.inner, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn handler() -> CacheHandler {
        CacheHandler::new(CacheConfig::default())
    }

    #[test]
    fn get_returns_stored_value() {
        let cache = handler();
        assert!(cache.get::<String>("subverse:news:info").is_none());
        assert!(!cache.exists("subverse:news:info"));

        cache.set("subverse:news:info", "news".to_string(), CachePolicy::minutes(30, 2));

        assert!(cache.exists("subverse:news:info"));
        assert_eq!(cache.get::<String>("subverse:news:info").as_deref(), Some("news"));
    }

    #[test]
    fn mismatched_type_reads_as_absent() {
        let cache = handler();
        cache.set("user:a:preferences", 42_u32, CachePolicy::minutes(5, 1));

        assert!(cache.get::<String>("user:a:preferences").is_none());
        assert_eq!(cache.get::<u32>("user:a:preferences"), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = handler();
        cache.set("user:a:info", 1_u8, CachePolicy::new(Duration::from_secs(10), 1));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.exists("user:a:info"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cache.exists("user:a:info"));
        assert!(cache.get::<u8>("user:a:info").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_recomputes_expiry() {
        let cache = handler();
        let policy = CachePolicy::new(Duration::from_secs(10), 0);
        cache.set("k:v", 1_u8, policy);

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k:v", 2_u8, policy);

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get::<u8>("k:v"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_removes_only_dead_entries() {
        let cache = handler();
        cache.set("k:short", 1_u8, CachePolicy::new(Duration::from_secs(1), 1));
        cache.set("k:long", 2_u8, CachePolicy::new(Duration::from_secs(100), 1));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.exists("k:long"));

        // The purged key no longer belongs to the shared bucket.
        assert_eq!(cache.invalidate_bucket("k"), 1);
    }

    #[test]
    fn zero_ttl_stores_nothing() {
        let cache = handler();
        cache.set("k:v", 1_u8, CachePolicy::new(Duration::ZERO, 1));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_bucket_removes_members_regardless_of_ttl() {
        let cache = handler();
        cache.set("user:a:saves:comment", BTreeSet::from([1_i64]), CachePolicy::minutes(10, 2));
        cache.set("user:a:saves:submission", BTreeSet::from([2_i64]), CachePolicy::minutes(10, 2));
        cache.set("user:a:preferences", 1_u8, CachePolicy::minutes(5, 1));
        cache.set("user:b:preferences", 2_u8, CachePolicy::minutes(5, 1));

        assert_eq!(cache.invalidate_bucket("user:a:saves"), 2);
        assert!(cache.exists("user:a:preferences"));

        assert_eq!(cache.invalidate_bucket("user:a"), 1);
        assert!(!cache.exists("user:a:preferences"));
        assert!(cache.exists("user:b:preferences"));
    }

    #[test]
    fn bucket_count_limits_membership() {
        let cache = handler();
        cache.set("user:a:saves:comment", 1_u8, CachePolicy::minutes(10, 1));

        assert_eq!(cache.invalidate_bucket("user:a"), 0);
        assert!(cache.exists("user:a:saves:comment"));
        assert_eq!(cache.invalidate_bucket("user:a:saves"), 1);
    }

    #[test]
    fn remove_drops_single_key() {
        let cache = handler();
        cache.set("user:a:preferences", 1_u8, CachePolicy::minutes(5, 1));
        assert!(cache.remove("user:a:preferences"));
        assert!(!cache.remove("user:a:preferences"));
        assert_eq!(cache.invalidate_bucket("user:a"), 0);
    }

    #[test]
    fn lru_eviction_forgets_bucket_membership() {
        let cache = CacheHandler::new(CacheConfig {
            max_entries: 2,
            ..Default::default()
        });
        cache.set("user:a:info", 1_u8, CachePolicy::minutes(5, 1));
        cache.set("user:b:info", 2_u8, CachePolicy::minutes(5, 1));
        cache.set("user:c:info", 3_u8, CachePolicy::minutes(5, 1));

        assert!(!cache.exists("user:a:info"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.invalidate_bucket("user:a"), 0);
        assert_eq!(cache.invalidate_bucket("user:c"), 1);
    }

    #[test]
    fn disabled_cache_always_misses() {
        let cache = CacheHandler::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        cache.set("k:v", 1_u8, CachePolicy::minutes(5, 1));
        assert!(cache.is_empty());
        assert!(!cache.exists("k:v"));
        assert!(cache.get::<u8>("k:v").is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = handler();
        cache.set("k:a", 1_u8, CachePolicy::minutes(5, 1));
        cache.set("k:b", 2_u8, CachePolicy::minutes(5, 1));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.invalidate_bucket("k"), 0);
    }

    #[test]
    fn concurrent_access_keeps_buckets_consistent() {
        let cache = Arc::new(handler());
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for round in 0..200 {
                        let key = format!("user:u{}:saves:comment", round % 10);
                        cache.set(key.clone(), worker, CachePolicy::minutes(5, 2));
                        let _ = cache.get::<i32>(&key);
                        if round % 7 == 0 {
                            cache.invalidate_bucket(&format!("user:u{}", round % 10));
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker thread should not panic");
        }

        for user in 0..10 {
            cache.invalidate_bucket(&format!("user:u{user}"));
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let cache = handler();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.inner.write().expect("cache lock should be acquired");
            panic!("poison cache lock");
        }));

        cache.set("k:v", 1_u8, CachePolicy::minutes(5, 1));
        assert_eq!(cache.get::<u8>("k:v"), Some(1));
    }
}
