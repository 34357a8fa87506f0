//! Cache configuration
//!
//! Capacity is fixed when a cache is built: the shard count and the arena
//! size of every bucket never change afterwards.

use crate::codec::HEADER_SIZE;
use serde::{Deserialize, Serialize};

/// Default number of shards
pub const DEFAULT_SHARD_COUNT: usize = 512;

/// Default arena size of each bucket (64 KiB)
pub const DEFAULT_BUCKET_CAPACITY: usize = 64 * 1024;

/// Sharded ring-buffer cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of independently locked buckets
    pub shard_count: usize,
    /// Arena size of each bucket in bytes
    pub bucket_capacity: usize,
    /// Compare the stored key on lookup and treat a mismatch as a miss
    ///
    /// Off by default: records are identified by key hash only, so two keys
    /// with the same hash mask each other.
    pub verify_keys: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            verify_keys: false,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a cache with exactly one bucket
    pub fn single_bucket(capacity: usize) -> Self {
        Self {
            shard_count: 1,
            bucket_capacity: capacity,
            verify_keys: false,
        }
    }

    /// Set the number of shards
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Set the arena size of each bucket
    pub fn with_bucket_capacity(mut self, capacity: usize) -> Self {
        self.bucket_capacity = capacity;
        self
    }

    /// Enable or disable stored-key verification on lookup
    pub fn with_key_verification(mut self, enabled: bool) -> Self {
        self.verify_keys = enabled;
        self
    }

    /// Total arena bytes across all shards
    pub fn total_capacity(&self) -> usize {
        self.shard_count.saturating_mul(self.bucket_capacity)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.shard_count == 0 {
            return Err("shard_count must be greater than 0".to_string());
        }

        if self.bucket_capacity < HEADER_SIZE {
            return Err(format!(
                "bucket_capacity must be at least {HEADER_SIZE} bytes to hold a record header"
            ));
        }

        if self.shard_count.checked_mul(self.bucket_capacity).is_none() {
            return Err("shard_count * bucket_capacity overflows".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CacheConfig::default();
        assert_eq!(config.shard_count, 512);
        assert_eq!(config.bucket_capacity, 65536);
        assert!(!config.verify_keys);
        assert_eq!(config.total_capacity(), 32 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::new()
            .with_shard_count(8)
            .with_bucket_capacity(1024)
            .with_key_verification(true);

        assert_eq!(config.shard_count, 8);
        assert_eq!(config.bucket_capacity, 1024);
        assert!(config.verify_keys);
        assert_eq!(config.total_capacity(), 8192);
    }

    #[test]
    fn test_validate_rejects_zero_shards() {
        let config = CacheConfig::new().with_shard_count(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_capacity_below_header() {
        assert!(CacheConfig::single_bucket(3).validate().is_err());
        assert!(CacheConfig::single_bucket(4).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_totals() {
        let config = CacheConfig::new()
            .with_shard_count(usize::MAX)
            .with_bucket_capacity(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"shard_count": 16}"#)
            .expect("Test operation should succeed");
        assert_eq!(config.shard_count, 16);
        assert_eq!(config.bucket_capacity, DEFAULT_BUCKET_CAPACITY);
        assert!(!config.verify_keys);
    }
}
