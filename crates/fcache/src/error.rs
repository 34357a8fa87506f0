//! Error types for cache operations

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// No live index entry exists for the key's hash
    #[error("Key not found")]
    KeyNotFound,

    /// An index entry points outside the arena
    ///
    /// This signals a broken bucket invariant rather than a caller mistake.
    #[error("Index out of range: offset {offset} outside arena of {capacity} bytes")]
    IndexOutOfRange {
        /// Offset stored in the index
        offset: usize,
        /// Arena capacity of the bucket
        capacity: usize,
    },

    /// Key or value is longer than the 16-bit length header can describe
    #[error("Key or value too large: key is {key_len} bytes, value is {value_len} bytes (max 65535)")]
    KeyOrValueTooLarge {
        /// Length of the rejected key
        key_len: usize,
        /// Length of the rejected value
        value_len: usize,
    },

    /// Encoded record does not fit in the bucket arena
    #[error("Record too large: {record_len} bytes exceeds bucket capacity of {capacity} bytes")]
    RecordTooLarge {
        /// Length of the encoded record including its header
        record_len: usize,
        /// Arena capacity of the bucket
        capacity: usize,
    },

    /// A record header describes more bytes than the arena holds
    #[error("Corrupt record header at offset {offset}")]
    CorruptRecord {
        /// Offset of the rejected header
        offset: usize,
    },

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed or unsupported snapshot stream
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// IO error during snapshot operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
