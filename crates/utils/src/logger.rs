use std::{fmt, str::FromStr};

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::{
    filter::{Directive, ParseError},
    fmt::{self as layer},
    prelude::*,
    EnvFilter,
};

/// Dependencies whose logs are capped at `warn`.
const QUIET_TARGETS: &[&str] = &["alloy_signer", "alloy_signer_local", "k256", "config"];

/// Format for log output.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty-printed format.
    #[default]
    Pretty,
    /// JSON format for structured logging.
    Json,
    /// Minimal format with only essential information.
    Minimal,
}

/// Returned when a log format name is not recognized.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log format `{0}`, expected one of: pretty, json, minimal")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "minimal" => Ok(Self::Minimal),
            _ => Err(UnknownLogFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Minimal => write!(f, "minimal"),
        }
    }
}

/// Builds the log filter: `RUST_LOG` if set, `info` otherwise, with noisy dependencies capped.
pub fn log_filter() -> Result<EnvFilter, ParseError> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for target in QUIET_TARGETS {
        filter = filter.add_directive(format!("{target}=warn").parse::<Directive>()?);
    }
    Ok(filter)
}

/// Initializes the logging system.
///
/// Filters out crate dependencies to reduce noise. Does nothing if a global subscriber is
/// already installed.
pub fn init_logger(log_format: LogFormat) -> Result<(), ParseError> {
    let base = tracing_subscriber::registry().with(log_filter()?);

    // A second initialization keeps the first subscriber.
    let _ = match log_format {
        LogFormat::Pretty => base
            .with(
                layer::layer()
                    .pretty()
                    .with_file(false)
                    .with_target(false)
                    .with_line_number(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init(),
        LogFormat::Json => base.with(layer::layer().json()).try_init(),
        LogFormat::Minimal => base.with(layer::layer().with_level(true).compact()).try_init(),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_formats() {
        assert_eq!("pretty".parse(), Ok(LogFormat::Pretty));
        assert_eq!("JSON".parse(), Ok(LogFormat::Json));
        assert_eq!("Minimal".parse(), Ok(LogFormat::Minimal));
        assert!("verbose".parse::<LogFormat>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for format in [LogFormat::Pretty, LogFormat::Json, LogFormat::Minimal] {
            assert_eq!(format.to_string().parse(), Ok(format));
        }
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logger(LogFormat::Minimal).unwrap();
        init_logger(LogFormat::Json).unwrap();
    }
}
