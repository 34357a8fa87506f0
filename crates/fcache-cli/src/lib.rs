//! Command-line access to fcache snapshot files.
//!
//! The `fcache` binary is a thin wrapper around this library: it parses a
//! [`Cli`], initializes logging, and calls [`run`]. Each invocation loads the
//! snapshot into a [`fcache::ShardedCache`] built from the resolved
//! configuration, so the same file can be inspected under different layouts.
//!
//! ```no_run
//! use fcache_cli::Cli;
//!
//! let cli = Cli::from_args();
//! fcache_cli::run(&cli, &mut std::io::stdout().lock()).expect("command failed");
//! ```

pub mod commands;
pub mod config;

pub use commands::{StatsReport, open_snapshot, run};
pub use config::{Cli, Command, LogFormat};
