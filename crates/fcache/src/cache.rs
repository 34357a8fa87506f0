//! Sharded cache
//!
//! A fixed array of independently locked [`RingBucket`]s. Each key is routed
//! to exactly one bucket by `hash(key) % shard_count`, so operations on
//! different shards never contend and no global lock exists.

#![allow(missing_docs)]

use crate::{
    bucket::RingBucket,
    config::CacheConfig,
    error::{CacheError, CacheResult},
    hash::{FnvBuildHasher, hash_key},
    stats::CacheStats,
    traits::ByteCache,
};
use bytes::Bytes;
use std::hash::BuildHasher;

/// Fixed-capacity key-value cache split across ring-buffer shards
pub struct ShardedCache<S = FnvBuildHasher> {
    buckets: Box<[RingBucket<S>]>,
    config: CacheConfig,
    hash_builder: S,
}

impl ShardedCache<FnvBuildHasher> {
    /// Create a cache using FNV-1a key hashing
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        Self::with_hasher(config, FnvBuildHasher::default())
    }
}

impl Default for ShardedCache<FnvBuildHasher> {
    /// 512 shards of 64 KiB each
    fn default() -> Self {
        let config = CacheConfig::default();
        let hash_builder = FnvBuildHasher::default();
        Self::build(config, hash_builder)
    }
}

impl<S: BuildHasher + Clone> ShardedCache<S> {
    /// Create a cache that hashes keys with `hash_builder`
    pub fn with_hasher(config: CacheConfig, hash_builder: S) -> CacheResult<Self> {
        config
            .validate()
            .map_err(CacheError::InvalidConfiguration)?;
        Ok(Self::build(config, hash_builder))
    }

    fn build(config: CacheConfig, hash_builder: S) -> Self {
        let buckets = (0..config.shard_count)
            .map(|_| {
                RingBucket::with_hasher(config.bucket_capacity, hash_builder.clone())
                    .with_key_verification(config.verify_keys)
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::info!(
            shard_count = config.shard_count,
            bucket_capacity = config.bucket_capacity,
            verify_keys = config.verify_keys,
            "sharded cache created"
        );

        Self {
            buckets,
            config,
            hash_builder,
        }
    }
}

impl<S: BuildHasher> ShardedCache<S> {
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn shard_count(&self) -> usize {
        self.buckets.len()
    }

    /// Arena size of each bucket
    pub fn bucket_capacity(&self) -> usize {
        self.config.bucket_capacity
    }

    /// Total arena bytes across all shards
    pub fn capacity(&self) -> usize {
        self.config.total_capacity()
    }

    #[inline]
    fn route(&self, key: &[u8]) -> (u64, &RingBucket<S>) {
        let hash = hash_key(&self.hash_builder, key);
        let shard = (hash % self.buckets.len() as u64) as usize;
        (hash, &self.buckets[shard])
    }

    /// Index of the shard `key` is stored in
    pub fn shard_for(&self, key: &[u8]) -> usize {
        let hash = hash_key(&self.hash_builder, key);
        (hash % self.buckets.len() as u64) as usize
    }

    pub fn shard(&self, index: usize) -> Option<&RingBucket<S>> {
        self.buckets.get(index)
    }

    pub fn shards(&self) -> impl Iterator<Item = &RingBucket<S>> {
        self.buckets.iter()
    }

    /// Store `value` under `key` in the key's shard
    pub fn set(&self, key: &[u8], value: &[u8]) -> CacheResult<()> {
        let (hash, bucket) = self.route(key);
        bucket.set_hashed(hash, key, value)
    }

    /// Copy of the value most recently stored under `key`
    pub fn get(&self, key: &[u8]) -> CacheResult<Bytes> {
        let (hash, bucket) = self.route(key);
        bucket.get_hashed(hash, key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let (hash, bucket) = self.route(key);
        bucket.contains_hashed(hash, key)
    }

    /// Live records across all shards
    ///
    /// Shards are summed one at a time, so the total is not a consistent
    /// point-in-time count while writers are active.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(RingBucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(RingBucket::is_empty)
    }

    pub fn clear(&self) {
        for bucket in &*self.buckets {
            bucket.clear();
        }
    }

    /// Statistics merged over every shard
    pub fn stats(&self) -> CacheStats {
        let mut shards = self.buckets.iter().map(RingBucket::stats);
        let mut total = shards.next().unwrap_or_default();
        for stats in shards {
            total.merge(&stats);
        }
        total
    }

    pub fn shard_stats(&self, index: usize) -> Option<CacheStats> {
        self.buckets.get(index).map(RingBucket::stats)
    }
}

impl<S: BuildHasher + Send + Sync> ByteCache for ShardedCache<S> {
    fn set(&self, key: &[u8], value: &[u8]) -> CacheResult<()> {
        Self::set(self, key, value)
    }

    fn get(&self, key: &[u8]) -> CacheResult<Bytes> {
        Self::get(self, key)
    }

    fn contains(&self, key: &[u8]) -> bool {
        Self::contains(self, key)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn clear(&self) {
        Self::clear(self);
    }

    fn stats(&self) -> CacheStats {
        Self::stats(self)
    }
}
