//! Command-line configuration.
//!
//! Cache layout can come from three places, later ones winning:
//! - built-in defaults (512 shards of 64 KiB)
//! - a JSON file passed with `--config`
//! - `--shards`, `--bucket-capacity` and `--verify-keys` (or their
//!   `FCACHE_*` environment variables)
//!
//! The layout only affects how records are held while a command runs.
//! Snapshots store logical records, so a snapshot written with one layout
//! can be read with another as long as every record fits in a bucket.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fcache::CacheConfig;
use std::fs;
use std::path::PathBuf;

/// Inspect and edit fcache snapshot files.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fcache",
    about = "Inspect and edit fcache snapshot files",
    version
)]
pub struct Cli {
    /// Snapshot file to operate on
    #[arg(long, short, env = "FCACHE_SNAPSHOT", default_value = "./cache.fcsn")]
    pub snapshot: PathBuf,

    /// JSON file with cache configuration
    #[arg(long, env = "FCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of shards, overrides the configuration file
    #[arg(long, env = "FCACHE_SHARDS")]
    pub shards: Option<usize>,

    /// Arena size of each shard in bytes, overrides the configuration file
    #[arg(long, env = "FCACHE_BUCKET_CAPACITY")]
    pub bucket_capacity: Option<usize>,

    /// Compare stored keys on lookup
    #[arg(long, env = "FCACHE_VERIFY_KEYS")]
    pub verify_keys: bool,

    /// Log output format
    #[arg(long, value_enum, env = "FCACHE_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log line format written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Snapshot operations.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Store a value and write the snapshot back
    Set {
        /// Record key
        key: String,
        /// Record value
        value: String,
    },
    /// Print the value stored under a key
    Get {
        /// Record key
        key: String,
    },
    /// Print whether a live record exists for a key
    Contains {
        /// Record key
        key: String,
    },
    /// List live keys with their value sizes, oldest first per shard
    Keys,
    /// Print occupancy of the cache
    Stats {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Drop every record and write an empty snapshot
    Clear,
}

impl Cli {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Resolve the cache layout from the configuration file and overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed,
    /// or if the resulting configuration is invalid.
    pub fn cache_config(&self) -> Result<CacheConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_json::from_str::<CacheConfig>(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => CacheConfig::default(),
        };

        if let Some(shards) = self.shards {
            config.shard_count = shards;
        }
        if let Some(capacity) = self.bucket_capacity {
            config.bucket_capacity = capacity;
        }
        if self.verify_keys {
            config.verify_keys = true;
        }

        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}
