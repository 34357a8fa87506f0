//! Cache statistics and metrics types
//!
//! Every bucket owns an [`AtomicCacheMetrics`] that is updated outside the
//! bucket lock. Counters are advisory: they never take part in deciding which
//! records are live.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)] // Ratios intentionally accept precision loss

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

// Use cache-aligned atomics to reduce false sharing
#[repr(align(64))] // Cache line alignment
#[derive(Debug)]
struct CacheAlignedAtomicU64(AtomicU64);

impl CacheAlignedAtomicU64 {
    fn new(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    #[inline]
    fn load(&self, ordering: Ordering) -> u64 {
        self.0.load(ordering)
    }

    #[inline]
    fn fetch_add(&self, value: u64, ordering: Ordering) -> u64 {
        self.0.fetch_add(value, ordering)
    }
}

/// Cache statistics snapshot
///
/// Point-in-time view of one bucket, or of a whole cache after merging the
/// snapshots of all its buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of get operations
    pub get_count: u64,
    /// Gets that returned a value
    pub hit_count: u64,
    /// Gets that returned `KeyNotFound`
    pub miss_count: u64,
    /// Successful set operations
    pub put_count: u64,
    /// Set operations rejected before touching the arena
    pub rejected_put_count: u64,
    /// Index entries removed because a later write overlapped them
    pub eviction_count: u64,
    /// Writes that crossed the end of the arena
    pub wrap_count: u64,
    /// Encoded bytes written into arenas
    pub bytes_written: u64,
    /// Live index entries at snapshot time
    pub entry_count: usize,
    /// Encoded bytes held by live records at snapshot time
    pub live_bytes: usize,
    /// Total arena bytes
    pub capacity_bytes: usize,
    /// Creation time of the oldest contributing bucket
    pub created_at: Instant,
}

impl CacheStats {
    /// Create new empty cache statistics
    pub fn new() -> Self {
        Self {
            get_count: 0,
            hit_count: 0,
            miss_count: 0,
            put_count: 0,
            rejected_put_count: 0,
            eviction_count: 0,
            wrap_count: 0,
            bytes_written: 0,
            entry_count: 0,
            live_bytes: 0,
            capacity_bytes: 0,
            created_at: Instant::now(),
        }
    }

    /// Calculate hit rate (hits / total gets)
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        if self.get_count == 0 {
            0.0
        } else {
            self.hit_count as f64 / self.get_count as f64
        }
    }

    /// Calculate miss rate (misses / total gets)
    #[inline]
    pub fn miss_rate(&self) -> f64 {
        if self.get_count == 0 {
            0.0
        } else {
            self.miss_count as f64 / self.get_count as f64
        }
    }

    /// Share of arena bytes held by live records
    #[inline]
    pub fn utilization(&self) -> f64 {
        if self.capacity_bytes == 0 {
            0.0
        } else {
            self.live_bytes as f64 / self.capacity_bytes as f64
        }
    }

    /// How many times the arenas have been written over, on average
    #[inline]
    pub fn turnover(&self) -> f64 {
        if self.capacity_bytes == 0 {
            0.0
        } else {
            self.bytes_written as f64 / self.capacity_bytes as f64
        }
    }

    /// Get cache age (time since creation)
    #[inline]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Merge statistics from another bucket
    pub fn merge(&mut self, other: &CacheStats) {
        self.get_count = self.get_count.saturating_add(other.get_count);
        self.hit_count = self.hit_count.saturating_add(other.hit_count);
        self.miss_count = self.miss_count.saturating_add(other.miss_count);
        self.put_count = self.put_count.saturating_add(other.put_count);
        self.rejected_put_count = self
            .rejected_put_count
            .saturating_add(other.rejected_put_count);
        self.eviction_count = self.eviction_count.saturating_add(other.eviction_count);
        self.wrap_count = self.wrap_count.saturating_add(other.wrap_count);
        self.bytes_written = self.bytes_written.saturating_add(other.bytes_written);
        self.entry_count = self.entry_count.saturating_add(other.entry_count);
        self.live_bytes = self.live_bytes.saturating_add(other.live_bytes);
        self.capacity_bytes = self.capacity_bytes.saturating_add(other.capacity_bytes);
        self.created_at = self.created_at.min(other.created_at);
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock-free per-bucket counters
#[derive(Debug)]
pub struct AtomicCacheMetrics {
    get_count: CacheAlignedAtomicU64,
    hit_count: CacheAlignedAtomicU64,
    miss_count: CacheAlignedAtomicU64,

    put_count: CacheAlignedAtomicU64,
    rejected_put_count: CacheAlignedAtomicU64,
    eviction_count: CacheAlignedAtomicU64,
    wrap_count: CacheAlignedAtomicU64,
    bytes_written: CacheAlignedAtomicU64,

    // Creation time (immutable after construction)
    created_at: Instant,
}

impl AtomicCacheMetrics {
    /// Create new atomic cache metrics
    pub fn new() -> Self {
        Self {
            get_count: CacheAlignedAtomicU64::new(0),
            hit_count: CacheAlignedAtomicU64::new(0),
            miss_count: CacheAlignedAtomicU64::new(0),
            put_count: CacheAlignedAtomicU64::new(0),
            rejected_put_count: CacheAlignedAtomicU64::new(0),
            eviction_count: CacheAlignedAtomicU64::new(0),
            wrap_count: CacheAlignedAtomicU64::new(0),
            bytes_written: CacheAlignedAtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    #[inline]
    pub fn record_get(&self, hit: bool) {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        if hit {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_put(&self, record_len: usize, wrapped: bool, evicted: usize) {
        self.put_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(record_len as u64, Ordering::Relaxed);
        if wrapped {
            self.wrap_count.fetch_add(1, Ordering::Relaxed);
        }
        if evicted > 0 {
            self.eviction_count
                .fetch_add(evicted as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_rejected_put(&self) {
        self.rejected_put_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters together with the bucket's live state
    pub fn snapshot(
        &self,
        entry_count: usize,
        live_bytes: usize,
        capacity_bytes: usize,
    ) -> CacheStats {
        CacheStats {
            get_count: self.get_count.load(Ordering::Acquire),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            put_count: self.put_count.load(Ordering::Relaxed),
            rejected_put_count: self.rejected_put_count.load(Ordering::Relaxed),
            eviction_count: self.eviction_count.load(Ordering::Relaxed),
            wrap_count: self.wrap_count.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            entry_count,
            live_bytes,
            capacity_bytes,
            created_at: self.created_at,
        }
    }
}

impl Default for AtomicCacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.get_count, 0);
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.turnover(), 0.0);
        assert_eq!(stats.utilization(), 0.0);
    }

    #[test]
    fn test_cache_stats_rates() {
        let mut stats = CacheStats::new();
        stats.get_count = 10;
        stats.hit_count = 7;
        stats.miss_count = 3;
        assert!((stats.hit_rate() - 0.7).abs() < f64::EPSILON);
        assert!((stats.miss_rate() - 0.3).abs() < f64::EPSILON);

        stats.capacity_bytes = 100;
        stats.bytes_written = 250;
        assert!((stats.turnover() - 2.5).abs() < f64::EPSILON);

        stats.live_bytes = 75;
        assert!((stats.utilization() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cache_stats_merge() {
        let mut stats1 = CacheStats::new();
        stats1.get_count = 10;
        stats1.hit_count = 8;
        stats1.miss_count = 2;
        stats1.entry_count = 3;
        stats1.live_bytes = 40;
        stats1.capacity_bytes = 100;

        let mut stats2 = CacheStats::new();
        stats2.get_count = 5;
        stats2.hit_count = 1;
        stats2.miss_count = 4;
        stats2.eviction_count = 6;
        stats2.entry_count = 2;
        stats2.live_bytes = 20;
        stats2.capacity_bytes = 100;

        let oldest = stats1.created_at.min(stats2.created_at);
        stats1.merge(&stats2);

        assert_eq!(stats1.get_count, 15);
        assert_eq!(stats1.hit_count, 9);
        assert_eq!(stats1.miss_count, 6);
        assert_eq!(stats1.eviction_count, 6);
        assert_eq!(stats1.entry_count, 5);
        assert_eq!(stats1.live_bytes, 60);
        assert!((stats1.utilization() - 0.3).abs() < f64::EPSILON);
        assert_eq!(stats1.capacity_bytes, 200);
        assert_eq!(stats1.created_at, oldest);
    }

    #[test]
    fn test_atomic_metrics_snapshot() {
        let metrics = AtomicCacheMetrics::new();
        metrics.record_get(true);
        metrics.record_get(false);
        metrics.record_get(false);
        metrics.record_put(38, false, 0);
        metrics.record_put(38, true, 2);
        metrics.record_rejected_put();

        let stats = metrics.snapshot(1, 38, 100);
        assert_eq!(stats.get_count, 3);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.put_count, 2);
        assert_eq!(stats.rejected_put_count, 1);
        assert_eq!(stats.eviction_count, 2);
        assert_eq!(stats.wrap_count, 1);
        assert_eq!(stats.bytes_written, 76);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.live_bytes, 38);
        assert_eq!(stats.capacity_bytes, 100);
        assert!((stats.utilization() - 0.38).abs() < f64::EPSILON);
    }
}
