//! Structured logging via `tracing`.
//!
//! The `CANOPY_LOG` environment variable takes precedence over the
//! configured level and accepts full `EnvFilter` directives. Results go to
//! stdout; logs go to stderr by default so CLI output stays pipeable.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off. Full filter
    /// directives go through `CANOPY_LOG` instead.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: text, json.
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stderr, stdout.
    #[serde(default = "default_output")]
    pub output: String,

    /// Colored output (text format only).
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_level(),
            format: default_format(),
            output: default_output(),
            color: default_true(),
        }
    }
}

/// Initialize the global subscriber. Call once at process start.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(|| std::io::sink()))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let to_stdout = match config.output.as_str() {
        "stdout" => true,
        "stderr" => false,
        other => {
            return Err(ConfigError::Logging(format!(
                "invalid log output: {other} (must be 'stdout' or 'stderr')"
            )))
        }
    };

    let base = Registry::default().with(filter);
    match config.format.as_str() {
        "json" => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339());
            if to_stdout {
                base.with(layer.with_writer(std::io::stdout)).init();
            } else {
                base.with(layer.with_writer(std::io::stderr)).init();
            }
        }
        "text" => {
            let layer = fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(config.color);
            if to_stdout {
                base.with(layer.with_writer(std::io::stdout)).init();
            } else {
                base.with(layer.with_writer(std::io::stderr)).init();
            }
        }
        other => {
            return Err(ConfigError::Logging(format!(
                "invalid log format: {other} (must be 'text' or 'json')"
            )))
        }
    }
    Ok(())
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env("CANOPY_LOG") {
        return Ok(filter);
    }
    // EnvFilter's directive grammar accepts nearly any string as a target
    // filter, so the configured level is validated as a plain level here.
    let level = config.level.to_ascii_lowercase();
    if level != "off" && Level::from_str(&level).is_err() {
        return Err(ConfigError::Logging(format!(
            "invalid log level {:?} (must be trace, debug, info, warn, error, or off)",
            config.level
        )));
    }
    Ok(EnvFilter::new(level))
}
