//! Tracing setup for the `channel-sounder` binary.
//!
//! The library itself only emits `tracing` events. The binary installs a single `fmt`
//! layer in the format picked on the command line. `RUST_LOG` wins over
//! `application.log_level` when it is set. Thread names are always printed, since
//! the rx and save workers run on named threads.
//!
//! ```no_run
//! use channel_sounder::config::SounderConfig;
//! use channel_sounder::logging::{self, OutputFormat};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SounderConfig::load_from("config/default.toml")?;
//! logging::init(&config, OutputFormat::Compact)?;
//! tracing::info!("Sounder started");
//! # Ok(())
//! # }
//! ```

use crate::config::SounderConfig;
use crate::error::{AppResult, SounderError};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Multi-line, colored
    Pretty,
    /// One line per event, no colors
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Install the global subscriber for `config.application.log_level` and `format`.
///
/// Returns `Ok(())` without touching anything if a subscriber is already installed.
pub fn init(config: &SounderConfig, format: OutputFormat) -> AppResult<()> {
    let level = parse_log_level(&config.application.log_level)?;
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    let base = fmt::layer().with_thread_names(true);
    let layer = match format {
        OutputFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        OutputFormat::Compact => base.compact().with_ansi(false).with_filter(filter).boxed(),
        OutputFormat::Json => base.json().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| SounderError::Configuration(format!("Failed to initialize tracing: {e}")))
}

/// Parse a configured level name, ignoring case.
pub fn parse_log_level(level: &str) -> AppResult<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(SounderError::Configuration(format!(
            "Invalid log level '{level}'. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("Debug").unwrap(), Level::DEBUG);
        assert!(matches!(
            parse_log_level("verbose"),
            Err(SounderError::Configuration(_))
        ));
    }

    #[test]
    fn test_init_rejects_unknown_level() {
        let mut config = SounderConfig::default();
        config.application.log_level = "loud".to_string();
        let err = init(&config, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_compact_is_default_format() {
        assert_eq!(OutputFormat::default(), OutputFormat::Compact);
    }
}
