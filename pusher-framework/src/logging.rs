//! Logging configuration and `tracing` subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{FrameworkError, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive: "trace", "debug", "info", "warn", "error" or a full
    /// `EnvFilter` expression.
    pub level: String,

    /// Log output format.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Build a config from a verbosity tier.
    ///
    /// `0` logs errors only, `1` adds informational events, anything higher
    /// turns on debug detail.
    pub fn from_verbosity(verbosity: u8, format: LogFormat) -> Self {
        Self {
            level: level_for_verbosity(verbosity).to_string(),
            format,
        }
    }
}

/// Map a verbosity tier to a level directive.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "info",
        _ => "debug",
    }
}

/// Initialize the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when it is set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| FrameworkError::LogLevel {
            level: config.level.clone(),
            message: e.to_string(),
        })?,
    };

    match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init(),
    }
    .map_err(|e| FrameworkError::logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_tiers() {
        assert_eq!(level_for_verbosity(0), "error");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "debug");
    }

    #[test]
    fn test_from_verbosity_keeps_format() {
        let config = LoggingConfig::from_verbosity(0, LogFormat::Json);
        assert_eq!(config.level, "error");
        assert_eq!(config.format, LogFormat::Json);
    }
}
