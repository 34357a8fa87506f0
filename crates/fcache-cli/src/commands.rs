//! Command execution against a snapshot file.
//!
//! Every command loads the snapshot into a fresh [`ShardedCache`], runs
//! against it, and writes the snapshot back only if the command changed it.
//! A missing snapshot file is treated as an empty cache.

use crate::config::{Cli, Command};
use anyhow::{Context, Result, bail};
use fcache::{CacheConfig, CacheError, ShardedCache};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Occupancy summary printed by `stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    /// Number of shards
    pub shard_count: usize,
    /// Arena size of each shard
    pub bucket_capacity: usize,
    /// Total arena bytes
    pub capacity_bytes: usize,
    /// Live records
    pub entry_count: usize,
    /// Encoded bytes held by live records
    pub live_bytes: usize,
    /// Live records in the fullest shard
    pub max_shard_entries: usize,
}

impl StatsReport {
    /// Collect occupancy from every shard of `cache`.
    pub fn collect(cache: &ShardedCache) -> Self {
        let stats = cache.stats();
        let max_shard_entries = cache.shards().map(|shard| shard.len()).max().unwrap_or(0);

        Self {
            shard_count: cache.shard_count(),
            bucket_capacity: cache.bucket_capacity(),
            capacity_bytes: stats.capacity_bytes,
            entry_count: stats.entry_count,
            live_bytes: stats.live_bytes,
            max_shard_entries,
        }
    }
}

/// Open the snapshot at `path`, or an empty cache if it does not exist.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the snapshot cannot
/// be loaded into it.
pub fn open_snapshot(path: &Path, config: CacheConfig) -> Result<ShardedCache> {
    let cache = ShardedCache::new(config)?;

    if path.exists() {
        let records = cache
            .load_from_file(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?;
        tracing::debug!(path = %path.display(), records, "snapshot opened");
    } else {
        tracing::info!(path = %path.display(), "snapshot not found, starting empty");
    }

    Ok(cache)
}

fn save_snapshot(cache: &ShardedCache, path: &Path) -> Result<()> {
    let records = cache
        .save_to_file(path)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    tracing::debug!(path = %path.display(), records, "snapshot written");
    Ok(())
}

/// Run the parsed command, writing its output to `out`.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or written, if a record
/// is rejected by the cache, or if `get` finds no live record.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let cache = open_snapshot(&cli.snapshot, cli.cache_config()?)?;

    match &cli.command {
        Command::Set { key, value } => {
            cache
                .set(key.as_bytes(), value.as_bytes())
                .with_context(|| format!("failed to set {key}"))?;
            save_snapshot(&cache, &cli.snapshot)?;
        }
        Command::Get { key } => match cache.get(key.as_bytes()) {
            Ok(value) => {
                out.write_all(&value)?;
                writeln!(out)?;
            }
            Err(CacheError::KeyNotFound) => bail!("key not found: {key}"),
            Err(err) => return Err(err.into()),
        },
        Command::Contains { key } => {
            writeln!(out, "{}", cache.contains(key.as_bytes()))?;
        }
        Command::Keys => {
            for shard in cache.shards() {
                for (key, value) in shard.entries()? {
                    writeln!(out, "{}\t{}", String::from_utf8_lossy(&key), value.len())?;
                }
            }
        }
        Command::Stats { json } => {
            let report = StatsReport::collect(&cache);
            if *json {
                serde_json::to_writer_pretty(&mut *out, &report)?;
                writeln!(out)?;
            } else {
                writeln!(out, "shards:          {}", report.shard_count)?;
                writeln!(out, "bucket capacity: {}", report.bucket_capacity)?;
                writeln!(out, "capacity bytes:  {}", report.capacity_bytes)?;
                writeln!(out, "entries:         {}", report.entry_count)?;
                writeln!(out, "live bytes:      {}", report.live_bytes)?;
                writeln!(out, "fullest shard:   {}", report.max_shard_entries)?;
            }
        }
        Command::Clear => {
            cache.clear();
            save_snapshot(&cache, &cli.snapshot)?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn run_args(snapshot: &Path, args: &[&str]) -> Result<String> {
        let path = snapshot.to_string_lossy().into_owned();
        let base = ["fcache", "--snapshot", &path, "--shards", "4", "--bucket-capacity", "1024"];
        let cli = Cli::try_parse_from(base.iter().chain(args.iter()).copied())
            .expect("arguments should parse");

        let mut out = Vec::new();
        run(&cli, &mut out)?;
        Ok(String::from_utf8(out).expect("output is utf-8"))
    }

    #[test]
    fn test_set_then_get_round_trips_through_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot = temp_dir.path().join("cache.fcsn");

        run_args(&snapshot, &["set", "greeting", "hello"]).expect("set succeeds");
        assert!(snapshot.exists());

        let out = run_args(&snapshot, &["get", "greeting"]).expect("get succeeds");
        assert_eq!(out, "hello\n");

        let out = run_args(&snapshot, &["contains", "greeting"]).expect("contains succeeds");
        assert_eq!(out, "true\n");
    }

    #[test]
    fn test_get_missing_key_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot = temp_dir.path().join("cache.fcsn");

        let err = run_args(&snapshot, &["get", "absent"]).expect_err("key is absent");
        assert!(err.to_string().contains("key not found"));
    }

    #[test]
    fn test_keys_lists_every_live_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot = temp_dir.path().join("cache.fcsn");

        run_args(&snapshot, &["set", "a", "1"]).expect("set succeeds");
        run_args(&snapshot, &["set", "b", "22"]).expect("set succeeds");

        let out = run_args(&snapshot, &["keys"]).expect("keys succeeds");
        let mut lines: Vec<&str> = out.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["a\t1", "b\t2"]);
    }

    #[test]
    fn test_stats_json_and_clear() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot = temp_dir.path().join("cache.fcsn");

        run_args(&snapshot, &["set", "key", "value"]).expect("set succeeds");

        let out = run_args(&snapshot, &["stats", "--json"]).expect("stats succeeds");
        let report: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(report["shard_count"], 4);
        assert_eq!(report["capacity_bytes"], 4096);
        assert_eq!(report["entry_count"], 1);
        assert_eq!(report["live_bytes"], 12);

        run_args(&snapshot, &["clear"]).expect("clear succeeds");
        let out = run_args(&snapshot, &["stats", "--json"]).expect("stats succeeds");
        let report: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(report["entry_count"], 0);
    }

    #[test]
    fn test_oversized_value_is_rejected_without_writing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot = temp_dir.path().join("cache.fcsn");
        let big = "x".repeat(2000);

        let err = run_args(&snapshot, &["set", "big", &big]).expect_err("record exceeds bucket");
        assert!(err.to_string().contains("failed to set big"));
        assert!(!snapshot.exists());
    }
}
