//! Sharded fixed-capacity key-value cache backed by circular byte buffers
//!
//! The cache is split into a fixed number of shards. Each shard is a
//! [`RingBucket`]: a byte arena of permanent size, a write cursor that wraps
//! at the end of the arena, and an index from key hash to the offset of the
//! key's most recent record. New records are written over the oldest bytes,
//! and any record whose start is overwritten silently drops out of the index.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                ShardedCache                 │
//! │        hash(key) % shard_count → shard      │
//! └─────────────────────────────────────────────┘
//!          │               │               │
//! ┌────────────────┐ ┌────────────────┐ ┌────────────────┐
//! │  RingBucket 0  │ │  RingBucket 1  │ │  RingBucket N  │
//! │ RwLock {       │ │      ...       │ │      ...       │
//! │   arena,       │ │                │ │                │
//! │   cursor,      │ │                │ │                │
//! │   index }      │ │                │ │                │
//! └────────────────┘ └────────────────┘ └────────────────┘
//!          │
//! ┌─────────────────────────────────────────────┐
//! │ codec: [key_len u16][value_len u16][k][v]   │
//! │        written and read modulo arena size   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use fcache::{CacheConfig, CacheError, ShardedCache};
//!
//! # fn example() -> Result<(), CacheError> {
//! let cache = ShardedCache::new(
//!     CacheConfig::new()
//!         .with_shard_count(64)
//!         .with_bucket_capacity(16 * 1024),
//! )?;
//!
//! cache.set(b"user:42", b"{\"name\":\"ada\"}")?;
//! assert_eq!(&cache.get(b"user:42")?[..], b"{\"name\":\"ada\"}");
//!
//! // Keys that were never written, or whose bytes have been overwritten,
//! // are simply gone.
//! assert!(matches!(cache.get(b"user:7"), Err(CacheError::KeyNotFound)));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Limitations
//!
//! Records are identified by the 64-bit hash of their key. Two keys with the
//! same hash share one index slot and the later write masks the earlier one.
//! Enable [`CacheConfig::verify_keys`] to compare the stored key on lookup, in
//! which case a masked key reads as `KeyNotFound` instead of returning the
//! other key's value.
//!
//! There is no expiry, no per-key delete, and no resizing. A snapshot
//! (see [`ShardedCache::save_snapshot`]) captures the logical key/value
//! mapping but offers no durability guarantee.

#![warn(missing_docs)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::float_cmp)] // Statistics need exact float comparisons

pub mod bucket;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod snapshot;
pub mod stats;
pub mod traits;

// Re-export commonly used types
pub use bucket::RingBucket;
pub use cache::ShardedCache;
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use hash::{Fnv1aHasher, FnvBuildHasher};
pub use stats::{AtomicCacheMetrics, CacheStats};
pub use traits::ByteCache;

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits

    pub use crate::{
        ByteCache, CacheConfig, CacheError, CacheResult, CacheStats, RingBucket, ShardedCache,
    };
}
