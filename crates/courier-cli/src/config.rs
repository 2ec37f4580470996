use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use courier_core::ForwarderConfig;

#[derive(Parser)]
#[command(name = "courier", about = "Forward newline-delimited messages to object storage.")]
pub struct Cli {
    /// Enable verbose output. (Specify twice for more verbosity.)
    #[arg(global = true, short = 'v', long, action = ArgAction::Count, default_value_t = 0)]
    verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub action: Action,
}

impl Cli {
    /// Gets the configured log level based on the user-supplied verbosity level.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Subcommand)]
pub enum Action {
    /// Validate the forwarder configuration and exit.
    Validate(ForwarderArgs),

    /// Forward messages read from files (or stdin) and print the report as JSON.
    Forward(ForwardArgs),
}

/// Forwarder settings. Flags override values from `--config`.
#[derive(Args, Clone)]
pub struct ForwarderArgs {
    /// JSON file with `destination_uri`, `key_prefix`, `size_limit`, ...
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Destination URI (`s3://bucket/optional/path`).
    #[arg(short = 'd', long)]
    pub destination: Option<String>,

    /// Prefix prepended to every generated key.
    #[arg(short = 'p', long)]
    pub key_prefix: Option<String>,

    /// Maximum size of one written object, in bytes.
    #[arg(short = 's', long, allow_negative_numbers = true)]
    pub size_limit: Option<i64>,

    /// Maximum number of concurrent writes.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Write oversize messages alone in their own object instead of rejecting the batch.
    #[arg(long)]
    pub isolate_oversize: bool,

    /// Local directory standing in for the object store (`<root>/<bucket>/<path>/<key>`).
    #[arg(short = 'r', long, default_value = "./courier-out")]
    pub root: PathBuf,
}

#[derive(Args, Clone)]
pub struct ForwardArgs {
    #[command(flatten)]
    pub forwarder: ForwarderArgs,

    /// Cancel the forwarding call after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Input files. Reads stdin when empty.
    pub files: Vec<PathBuf>,
}

impl ForwarderArgs {
    /// Loads `--config` (if any) and applies the flag overrides on top.
    pub async fn load(&self) -> anyhow::Result<ForwarderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = tokio::fs::read(path).await?;
                serde_json::from_slice::<ForwarderConfig>(&raw)?
            }
            None => ForwarderConfig::default(),
        };

        if let Some(destination) = &self.destination {
            config.destination_uri = destination.clone();
        }
        if let Some(key_prefix) = &self.key_prefix {
            config.key_prefix = key_prefix.clone();
        }
        if let Some(size_limit) = self.size_limit {
            config.size_limit = size_limit;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if self.isolate_oversize {
            config.oversize_policy = courier_core::domain::OversizePolicy::Isolate;
        }
        Ok(config)
    }
}
