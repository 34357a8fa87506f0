//! Single ring-buffer bucket
//!
//! A bucket owns a fixed-size byte arena, a write cursor, and an index from
//! key hash to the offset where that key's most recent record begins.
//! Records are appended at the cursor and the cursor wraps at the end of the
//! arena, so new records physically overwrite the oldest ones. Whenever a
//! write touches the first byte of an indexed record, that record's index
//! entry is dropped in the same critical section as the write.
//!
//! Records are laid out back to back, so the only record a write can run
//! into is the one whose header starts exactly where the cursor is.
//! Containment of the record *start* in the written ranges is therefore
//! sufficient to detect every overlapped record.
//!
//! All state sits behind one `parking_lot::RwLock`: gets share the lock,
//! sets take it exclusively.

#![allow(missing_docs)]

use crate::{
    codec,
    config::CacheConfig,
    error::{CacheError, CacheResult},
    hash::{FnvBuildHasher, hash_key},
    stats::{AtomicCacheMetrics, CacheStats},
    traits::ByteCache,
};
use bytes::Bytes;
use parking_lot::RwLock;
use std::{collections::HashMap, hash::BuildHasher};

/// State guarded by the bucket lock
struct BucketState {
    arena: Box<[u8]>,
    /// Offset where the next record begins, always `< arena.len()`
    cursor: usize,
    /// Key hash to record start offset
    index: HashMap<u64, usize>,
}

impl BucketState {
    fn new(capacity: usize) -> Self {
        Self {
            arena: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            index: HashMap::new(),
        }
    }

    /// Decode the record indexed under `hash`, returning `(key, value)`
    fn lookup(&self, hash: u64) -> CacheResult<(Vec<u8>, Vec<u8>)> {
        let offset = *self.index.get(&hash).ok_or(CacheError::KeyNotFound)?;
        if offset >= self.arena.len() {
            return Err(CacheError::IndexOutOfRange {
                offset,
                capacity: self.arena.len(),
            });
        }
        codec::decode(&self.arena, offset)
    }

    /// Encoded bytes held by indexed records
    fn live_bytes(&self) -> usize {
        self.index
            .values()
            .filter_map(|&offset| codec::decode_header(&self.arena, offset).ok())
            .map(codec::RecordHeader::record_len)
            .sum()
    }
}

/// Evictions are logged at debug, plain writes at trace
#[cfg(feature = "tracing")]
fn log_write(offset: usize, record_len: usize, evicted: usize, wrapped: bool) {
    if evicted > 0 {
        tracing::debug!(offset, record_len, evicted, wrapped, "overwritten records evicted");
    } else {
        tracing::trace!(offset, record_len, wrapped, "record written");
    }
}

/// Fixed-capacity ring-buffer key-value store
pub struct RingBucket<S = FnvBuildHasher> {
    state: RwLock<BucketState>,
    capacity: usize,
    verify_keys: bool,
    hash_builder: S,
    metrics: AtomicCacheMetrics,
}

impl RingBucket<FnvBuildHasher> {
    /// Create a bucket with an arena of `capacity` bytes using FNV-1a hashing
    ///
    /// A capacity below the 4-byte header is accepted but can never hold a
    /// record; every set fails with `RecordTooLarge`.
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, FnvBuildHasher::default())
    }

    /// Create a bucket sized and configured like one shard of `config`
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.bucket_capacity).with_key_verification(config.verify_keys)
    }
}

impl<S: BuildHasher> RingBucket<S> {
    /// Create a bucket that hashes keys with `hash_builder`
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            state: RwLock::new(BucketState::new(capacity)),
            capacity,
            verify_keys: false,
            hash_builder,
            metrics: AtomicCacheMetrics::new(),
        }
    }

    /// Compare the stored key on lookup, reporting a mismatch as a miss
    pub fn with_key_verification(mut self, enabled: bool) -> Self {
        self.verify_keys = enabled;
        self
    }

    /// Arena size in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offset where the next record will begin
    pub fn cursor(&self) -> usize {
        self.state.read().cursor
    }

    pub fn hash_key(&self, key: &[u8]) -> u64 {
        hash_key(&self.hash_builder, key)
    }

    /// Store `value` under `key`
    ///
    /// Fails without touching the bucket if the key or value is longer than
    /// 65535 bytes or the encoded record is larger than the arena.
    pub fn set(&self, key: &[u8], value: &[u8]) -> CacheResult<()> {
        self.set_hashed(self.hash_key(key), key, value)
    }

    /// Copy of the value most recently stored under `key`
    pub fn get(&self, key: &[u8]) -> CacheResult<Bytes> {
        self.get_hashed(self.hash_key(key), key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.contains_hashed(self.hash_key(key), key)
    }

    /// Encode and size-check a record before any lock is taken
    fn prepare(&self, key: &[u8], value: &[u8]) -> CacheResult<Vec<u8>> {
        let record = codec::encode(key, value)?;
        if record.len() > self.capacity {
            return Err(CacheError::RecordTooLarge {
                record_len: record.len(),
                capacity: self.capacity,
            });
        }
        Ok(record)
    }

    pub(crate) fn set_hashed(&self, hash: u64, key: &[u8], value: &[u8]) -> CacheResult<()> {
        let record = match self.prepare(key, value) {
            Ok(record) => record,
            Err(err) => {
                self.metrics.record_rejected_put();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    key_len = key.len(),
                    value_len = value.len(),
                    capacity = self.capacity,
                    error = %err,
                    "rejected set"
                );
                return Err(err);
            }
        };

        let mut guard = self.state.write();
        let state = &mut *guard;
        let start = state.cursor;

        let ranges = codec::write_wrapping(&mut state.arena, start, &record)?;

        let live_before = state.index.len();
        state.index.retain(|_, offset| !ranges.contains(*offset));
        let evicted = live_before - state.index.len();

        state.index.insert(hash, start);
        state.cursor = (start + record.len()) % self.capacity;
        drop(guard);

        #[cfg(feature = "tracing")]
        log_write(start, record.len(), evicted, ranges.wrapped());

        self.metrics
            .record_put(record.len(), ranges.wrapped(), evicted);
        Ok(())
    }

    pub(crate) fn get_hashed(&self, hash: u64, key: &[u8]) -> CacheResult<Bytes> {
        let result = self.state.read().lookup(hash);

        match result {
            Ok((stored_key, value)) if !self.verify_keys || stored_key == key => {
                self.metrics.record_get(true);
                Ok(Bytes::from(value))
            }
            Ok(_) | Err(CacheError::KeyNotFound) => {
                self.metrics.record_get(false);
                Err(CacheError::KeyNotFound)
            }
            Err(err) => {
                self.metrics.record_get(false);
                Err(err)
            }
        }
    }

    pub(crate) fn contains_hashed(&self, hash: u64, key: &[u8]) -> bool {
        let state = self.state.read();
        if !self.verify_keys {
            return state.index.contains_key(&hash);
        }
        state
            .lookup(hash)
            .is_ok_and(|(stored_key, _)| stored_key == key)
    }

    /// Live records decoded under a single read lock, oldest first
    pub fn entries(&self) -> CacheResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let state = self.state.read();
        let capacity = state.arena.len();
        let cursor = state.cursor;

        let mut offsets: Vec<usize> = state.index.values().copied().collect();
        // The record starting at the cursor is the oldest one still present
        offsets.sort_unstable_by_key(|&offset| (offset + capacity - cursor) % capacity);

        offsets
            .into_iter()
            .map(|offset| codec::decode(&state.arena, offset))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset to the freshly constructed state
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.arena.fill(0);
        state.cursor = 0;
        state.index.clear();
    }

    /// Point `key` at an arbitrary offset, bypassing the write path
    #[cfg(test)]
    pub(crate) fn insert_raw_index(&self, key: &[u8], offset: usize) {
        let hash = self.hash_key(key);
        self.state.write().index.insert(hash, offset);
    }

    pub fn stats(&self) -> CacheStats {
        let (entry_count, live_bytes) = {
            let state = self.state.read();
            (state.index.len(), state.live_bytes())
        };
        self.metrics.snapshot(entry_count, live_bytes, self.capacity)
    }
}

impl<S: BuildHasher + Send + Sync> ByteCache for RingBucket<S> {
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
