//! CLI argument parsing for pushers.

use std::path::PathBuf;

use clap::Parser;

use crate::logging::{LogFormat, LoggingConfig};

/// Default location of the target configuration directory.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/prometheus-pusher/conf.d";

/// Common CLI arguments for a metrics pusher.
#[derive(Parser, Debug, Clone)]
#[command(about = "Scrape metrics endpoints and push them to a Prometheus Pushgateway")]
#[command(version)]
pub struct PusherArgs {
    /// Config file or directory. Every `*.toml` / `*.json5` file of a
    /// directory is loaded.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Do not post the metrics, print them to stdout instead.
    #[arg(long)]
    pub dummy: bool,

    /// Logging verbosity: 0 = errors, 1 = info, 2+ = debug.
    #[arg(short, long, default_value_t = 1)]
    pub verbosity: u8,

    /// Override the log filter (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Instance name reported to the gateway (default: local host name).
    #[arg(long)]
    pub instance: Option<String>,

    /// Run a single cycle, report, and exit.
    #[arg(long)]
    pub once: bool,
}

impl PusherArgs {
    /// Parse CLI arguments from the process environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Resolve the logging configuration, `--log-level` winning over
    /// `--verbosity`.
    pub fn logging(&self) -> LoggingConfig {
        match self.log_level {
            Some(ref level) => LoggingConfig {
                level: level.clone(),
                format: self.log_format,
            },
            None => LoggingConfig::from_verbosity(self.verbosity, self.log_format),
        }
    }
}
