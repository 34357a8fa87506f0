//! Core cache trait
//!
//! Both a single [`RingBucket`](crate::RingBucket) and a
//! [`ShardedCache`](crate::ShardedCache) implement [`ByteCache`], so layers
//! built on top (request servers, snapshot tooling) can be written against
//! either.

#![allow(missing_docs)]

use crate::{error::CacheResult, stats::CacheStats};
use bytes::Bytes;

/// Blocking byte-oriented key-value cache
///
/// Calls either complete or block on a lock; there is no cancellation.
pub trait ByteCache: Send + Sync {
    /// Store a record, possibly evicting older records it overwrites.
    fn set(&self, key: &[u8], value: &[u8]) -> CacheResult<()>;

    /// Fails with `KeyNotFound` if no live record exists for the key.
    fn get(&self, key: &[u8]) -> CacheResult<Bytes>;

    fn contains(&self, key: &[u8]) -> bool;

    /// Live index entries, not bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record and reset write positions.
    fn clear(&self);

    fn stats(&self) -> CacheStats;
}
