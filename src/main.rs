#![deny(clippy::mod_module_files)]
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod advertisement;
mod config;
mod driver;
mod emit;
mod error;
mod filter;
mod pattern;
mod pktline;
mod refs;
mod remote;
mod transport;

use config::LsRemoteConfig;
use driver::LsRemote;
use pattern::Patterns;
use transport::DefaultConnector;

/// List references in a remote repository
#[derive(Parser, Debug)]
#[command(name = "git-ls-remote", version)]
struct Cli {
    /// Abort the connection if no activity for this many seconds (negative: no limit)
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    timeout: Option<i64>,

    /// Path to git-upload-pack on the remote side
    #[arg(long, value_name = "EXEC")]
    upload_pack: Option<String>,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Repository to list: a path, or a file, ssh, git or http(s) URL
    #[arg(value_name = "REMOTE")]
    remote: String,

    /// Only show refs whose name ends with one of these patterns
    #[arg(value_name = "PATTERNS")]
    patterns: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Compile patterns before touching the network
    let patterns = Patterns::new(&cli.patterns)?;

    let mut config = LsRemoteConfig::load().context("Failed to load configuration")?;
    if let Some(timeout) = cli.timeout {
        config.timeout = Some(timeout);
    }
    if let Some(upload_pack) = cli.upload_pack {
        config.upload_pack = upload_pack;
    }

    let mut ls_remote = LsRemote::new(cli.remote.clone(), patterns);
    if let Some(timeout) = config.timeout {
        ls_remote = ls_remote.with_timeout_secs(timeout);
    }

    let connector = DefaultConnector::new(config.transport_settings());
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());
    ls_remote
        .run(&connector, &mut output)
        .with_context(|| format!("Failed to list refs of {}", cli.remote))?;

    Ok(())
}
