//! Quorum query cache.
//!
//! Memoizes query results under semantic keys with a per-entry TTL and
//! bucket-based bulk invalidation:
//!
//! - [`CachingKey`] builds canonical keys and derives their buckets
//! - [`CachePolicy`] sets an entry's lifetime and bucket fan-out
//! - [`CacheHandler`] stores entries and drops them by key or bucket
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries = 10000
//! sweep_interval_ms = 60000
//! ```

mod config;
mod keys;
mod lock;
mod policy;
mod registry;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use keys::CachingKey;
pub use policy::CachePolicy;
pub use registry::BucketRegistry;
pub use store::CacheHandler;
pub use sweeper::spawn_sweeper;
