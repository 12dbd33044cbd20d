//! Bidirectional bucket registry.
//!
//! Tracks which cache keys belong to which invalidation buckets so a bucket
//! can be dropped in one call and a key's memberships can be forgotten when
//! the key leaves the store for any reason.

use std::collections::{HashMap, HashSet};

/// Tracks bucket → keys and key → buckets mappings.
///
/// Not synchronized on its own; the owning store guards it together with the
/// entries so both views always change in one critical section.
#[derive(Debug, Default)]
pub struct BucketRegistry {
    bucket_to_keys: HashMap<String, HashSet<String>>,
    key_to_buckets: HashMap<String, Vec<String>>,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as a member of every bucket in `buckets`, replacing any
    /// previous memberships of that key.
    pub fn register(&mut self, key: &str, buckets: Vec<String>) {
        self.unregister(key);
        if buckets.is_empty() {
            return;
        }
        for bucket in &buckets {
            self.bucket_to_keys
                .entry(bucket.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.key_to_buckets.insert(key.to_string(), buckets);
    }

    /// Forget every membership of `key`.
    pub fn unregister(&mut self, key: &str) {
        let Some(buckets) = self.key_to_buckets.remove(key) else {
            return;
        };
        for bucket in buckets {
            if let Some(keys) = self.bucket_to_keys.get_mut(&bucket) {
                keys.remove(key);
                if keys.is_empty() {
                    self.bucket_to_keys.remove(&bucket);
                }
            }
        }
    }

    /// Remove a bucket and every membership of the keys it contained.
    ///
    /// Returns the keys that were in the bucket.
    pub fn take_bucket(&mut self, bucket: &str) -> HashSet<String> {
        let keys = self.bucket_to_keys.remove(bucket).unwrap_or_default();
        for key in &keys {
            self.unregister(key);
        }
        keys
    }

    pub fn buckets_for_key(&self, key: &str) -> &[String] {
        self.key_to_buckets
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.bucket_to_keys.clear();
        self.key_to_buckets.clear();
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_to_keys.len()
    }

    pub fn key_count(&self) -> usize {
        self.key_to_buckets.len()
    }
}
