//! Logical snapshots
//!
//! A snapshot stores the live key/value pairs of a cache, not its arenas, so
//! it can be loaded into a cache with a different shard count or bucket
//! capacity. There is no durability guarantee: a snapshot reflects whatever
//! each shard held at the moment it was read, shard by shard.
//!
//! # Format
//!
//! ```text
//! ┌────────────┬─────────────┬────────────────┬───────────────────────┐
//! │ "FCSN" (4) │ version (1) │ count: u64 BE  │ count × record        │
//! └────────────┴─────────────┴────────────────┴───────────────────────┘
//! ```
//!
//! Each record uses the arena layout from [`codec`](crate::codec). Records
//! are grouped by shard and ordered oldest first within a shard, so loading
//! into an identical configuration reproduces the same retention order.

use crate::{
    cache::ShardedCache,
    codec::{self, HEADER_SIZE, RecordHeader},
    error::{CacheError, CacheResult},
};
use std::{
    fs::{self, File},
    hash::BuildHasher,
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

/// Magic bytes at the start of every snapshot
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"FCSN";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u8 = 1;

/// `cache.fcsn` becomes `cache.fcsn.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> CacheResult<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CacheError::Snapshot(format!("truncated {what}"))
        } else {
            CacheError::Io(err)
        }
    })
}

/// Parse and validate every record before anything is inserted
fn read_records<R: Read>(
    reader: &mut R,
    bucket_capacity: usize,
) -> CacheResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut magic = [0u8; 4];
    read_exact_or_truncated(reader, &mut magic, "magic")?;
    if magic != SNAPSHOT_MAGIC {
        return Err(CacheError::Snapshot(format!("bad magic {magic:02x?}")));
    }

    let mut version = [0u8; 1];
    read_exact_or_truncated(reader, &mut version, "version")?;
    if version[0] != SNAPSHOT_VERSION {
        return Err(CacheError::Snapshot(format!(
            "unsupported version {}",
            version[0]
        )));
    }

    let mut count = [0u8; 8];
    read_exact_or_truncated(reader, &mut count, "record count")?;
    let count = u64::from_be_bytes(count);

    let mut records = Vec::with_capacity(usize::try_from(count).unwrap_or(usize::MAX).min(1024));
    for _ in 0..count {
        let mut raw = [0u8; HEADER_SIZE];
        read_exact_or_truncated(reader, &mut raw, "record header")?;
        let header = RecordHeader::from_bytes(raw);

        if header.record_len() > bucket_capacity {
            return Err(CacheError::RecordTooLarge {
                record_len: header.record_len(),
                capacity: bucket_capacity,
            });
        }

        let mut key = vec![0u8; header.key_len()];
        let mut value = vec![0u8; header.value_len()];
        read_exact_or_truncated(reader, &mut key, "record key")?;
        read_exact_or_truncated(reader, &mut value, "record value")?;
        records.push((key, value));
    }

    let mut trailing = [0u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(CacheError::Snapshot("trailing data after last record".to_string()));
    }

    Ok(records)
}

impl<S: BuildHasher> ShardedCache<S> {
    /// Write every live record to `writer`, returning the number written
    pub fn save_snapshot<W: Write>(&self, mut writer: W) -> CacheResult<usize> {
        let mut records = Vec::new();
        for bucket in self.shards() {
            records.extend(bucket.entries()?);
        }

        writer.write_all(&SNAPSHOT_MAGIC)?;
        writer.write_all(&[SNAPSHOT_VERSION])?;
        writer.write_all(&(records.len() as u64).to_be_bytes())?;
        for (key, value) in &records {
            writer.write_all(&codec::encode(key, value)?)?;
        }
        writer.flush()?;

        #[cfg(feature = "tracing")]
        tracing::info!(records = records.len(), "snapshot saved");

        Ok(records.len())
    }

    /// Replace the cache contents with the records in `reader`
    ///
    /// The whole snapshot is parsed first; if any part is malformed or a record
    /// cannot fit in this cache's buckets the cache is left untouched.
    pub fn load_snapshot<R: Read>(&self, mut reader: R) -> CacheResult<usize> {
        let records = read_records(&mut reader, self.bucket_capacity())?;

        self.clear();
        for (key, value) in &records {
            self.set(key, value)?;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            records = records.len(),
            live = self.len(),
            "snapshot loaded"
        );

        Ok(records.len())
    }

    /// Save a snapshot to `path`, replacing any existing file
    ///
    /// The snapshot is written to a sibling `.tmp` file, synced, and renamed
    /// over `path`, so a failed save leaves the previous file in place.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> CacheResult<usize> {
        let path = path.as_ref();
        let temp_path = temp_path_for(path);

        let written = match self.write_synced(&temp_path) {
            Ok(written) => written,
            Err(err) => {
                let _ = fs::remove_file(&temp_path);
                return Err(err);
            }
        };
        fs::rename(&temp_path, path)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "snapshot file written");

        Ok(written)
    }

    fn write_synced(&self, temp_path: &Path) -> CacheResult<usize> {
        let mut writer = BufWriter::new(File::create(temp_path)?);
        let written = self.save_snapshot(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|err| CacheError::Io(err.into_error()))?;
        file.sync_all()?;
        Ok(written)
    }

    /// Replace the cache contents with the snapshot stored at `path`
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> CacheResult<usize> {
        let file = File::open(path.as_ref())?;
        self.load_snapshot(BufReader::new(file))
    }
}
