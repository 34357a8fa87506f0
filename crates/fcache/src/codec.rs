//! Record encoding inside a circular arena
//!
//! A record is a 4-byte big-endian length header followed by the raw key and
//! value bytes:
//!
//! ```text
//! ┌──────────────┬────────────────┬───────────┬─────────────┐
//! │ key_len: u16 │ value_len: u16 │ key bytes │ value bytes │
//! └──────────────┴────────────────┴───────────┴─────────────┘
//! ```
//!
//! Inside a bucket the arena is circular, so every read and write here works
//! in terms of an offset that wraps to zero at the end of the arena. A single
//! record touches at most two contiguous byte ranges.

#![allow(missing_docs)]

use crate::error::{CacheError, CacheResult};
use std::ops::Range;

/// Length of the record header in bytes
pub const HEADER_SIZE: usize = 4;

/// Largest key or value a header can describe
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    key_len: u16,
    value_len: u16,
}

impl RecordHeader {
    /// Build a header for the given field lengths
    pub fn new(key_len: usize, value_len: usize) -> CacheResult<Self> {
        match (u16::try_from(key_len), u16::try_from(value_len)) {
            (Ok(key_len), Ok(value_len)) => Ok(Self { key_len, value_len }),
            _ => Err(CacheError::KeyOrValueTooLarge { key_len, value_len }),
        }
    }

    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            key_len: u16::from_be_bytes([bytes[0], bytes[1]]),
            value_len: u16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }

    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let [k0, k1] = self.key_len.to_be_bytes();
        let [v0, v1] = self.value_len.to_be_bytes();
        [k0, k1, v0, v1]
    }

    pub fn key_len(self) -> usize {
        usize::from(self.key_len)
    }

    pub fn value_len(self) -> usize {
        usize::from(self.value_len)
    }

    /// Total encoded length including the header
    pub fn record_len(self) -> usize {
        HEADER_SIZE + self.key_len() + self.value_len()
    }
}

/// The byte ranges a single wrapping write touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenRanges {
    first: Range<usize>,
    second: Option<Range<usize>>,
}

impl WrittenRanges {
    /// Ranges in write order; the second one exists only when the write wrapped
    pub fn iter(&self) -> impl Iterator<Item = &Range<usize>> {
        std::iter::once(&self.first).chain(self.second.as_ref())
    }

    /// Whether `offset` lies inside any touched range
    pub fn contains(&self, offset: usize) -> bool {
        self.iter().any(|range| range.contains(&offset))
    }

    pub fn wrapped(&self) -> bool {
        self.second.is_some()
    }

    /// Total number of bytes written
    pub fn len(&self) -> usize {
        self.iter().map(ExactSizeIterator::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encoded length of a record, without validating field sizes
#[inline]
pub fn encoded_len(key: &[u8], value: &[u8]) -> usize {
    HEADER_SIZE + key.len() + value.len()
}

/// Encode a key/value pair into a standalone record
pub fn encode(key: &[u8], value: &[u8]) -> CacheResult<Vec<u8>> {
    let header = RecordHeader::new(key.len(), value.len())?;

    let mut record = Vec::with_capacity(header.record_len());
    record.extend_from_slice(&header.to_bytes());
    record.extend_from_slice(key);
    record.extend_from_slice(value);
    Ok(record)
}

/// Copy `bytes` into `arena` starting at `offset`, continuing from the start
/// of the arena when the end is reached.
pub fn write_wrapping(arena: &mut [u8], offset: usize, bytes: &[u8]) -> CacheResult<WrittenRanges> {
    let capacity = arena.len();
    if bytes.len() > capacity {
        return Err(CacheError::RecordTooLarge {
            record_len: bytes.len(),
            capacity,
        });
    }
    if offset >= capacity {
        return Err(CacheError::IndexOutOfRange { offset, capacity });
    }

    let head = (capacity - offset).min(bytes.len());
    let (first_part, second_part) = bytes.split_at(head);
    arena[offset..offset + head].copy_from_slice(first_part);
    arena[..second_part.len()].copy_from_slice(second_part);

    Ok(WrittenRanges {
        first: offset..offset + head,
        second: (!second_part.is_empty()).then(|| 0..second_part.len()),
    })
}

/// Fill `out` from the arena starting at `offset`, wrapping at the end.
/// Returns the offset following the last byte read.
///
/// The caller guarantees `offset < arena.len()` and `out.len() <= arena.len()`.
fn read_wrapping(arena: &[u8], mut offset: usize, out: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < out.len() {
        let n = (arena.len() - offset).min(out.len() - filled);
        out[filled..filled + n].copy_from_slice(&arena[offset..offset + n]);
        filled += n;
        offset += n;
        if offset == arena.len() {
            offset = 0;
        }
    }
    offset
}

/// Read the header of the record starting at `offset`
pub fn decode_header(arena: &[u8], offset: usize) -> CacheResult<RecordHeader> {
    let capacity = arena.len();
    if offset >= capacity {
        return Err(CacheError::IndexOutOfRange { offset, capacity });
    }
    if capacity < HEADER_SIZE {
        return Err(CacheError::CorruptRecord { offset });
    }

    let mut raw = [0u8; HEADER_SIZE];
    read_wrapping(arena, offset, &mut raw);
    let header = RecordHeader::from_bytes(raw);

    // A record longer than the arena can never have been written
    if header.record_len() > capacity {
        return Err(CacheError::CorruptRecord { offset });
    }
    Ok(header)
}

/// Decode the record starting at `offset` into owned key and value bytes
pub fn decode(arena: &[u8], offset: usize) -> CacheResult<(Vec<u8>, Vec<u8>)> {
    let header = decode_header(arena, offset)?;

    let mut key = vec![0u8; header.key_len()];
    let mut value = vec![0u8; header.value_len()];

    let body = (offset + HEADER_SIZE) % arena.len();
    let after_key = read_wrapping(arena, body, &mut key);
    read_wrapping(arena, after_key, &mut value);

    Ok((key, value))
}
