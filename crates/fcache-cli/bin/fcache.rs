//! fcache binary entry point.
//!
//! Parses command-line arguments, initializes logging on stderr, and runs
//! the requested snapshot command. Output goes to stdout.

use anyhow::Result;
use fcache_cli::{Cli, LogFormat};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::from_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    tracing::debug!(snapshot = %cli.snapshot.display(), command = ?cli.command, "running command");

    fcache_cli::run(&cli, &mut std::io::stdout().lock())
}
