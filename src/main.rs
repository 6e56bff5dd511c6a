//! CLI Entry Point for channel-sounder
//!
//! Provides command-line interface for:
//! - Running a timed burst of the acquisition core against the synthetic source
//! - Checking a configuration file without allocating any buffers
//!
//! # Usage
//!
//! Record for ten seconds, paced to the configured sample rate:
//! ```bash
//! channel-sounder --config config/default.toml record --duration-secs 10 --realtime
//! ```
//!
//! Check a configuration:
//! ```bash
//! channel-sounder --config config/default.toml check-config
//! ```

use anyhow::{Context, Result};
use channel_sounder::config::SounderConfig;
use channel_sounder::logging::{self, OutputFormat};
use channel_sounder::source::SyntheticSource;
use channel_sounder::Sounder;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "channel-sounder")]
#[command(about = "Real-time acquisition core of a multi-channel channel sounder", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for OutputFormat {
    fn from(value: LogFormat) -> Self {
        match value {
            LogFormat::Pretty => OutputFormat::Pretty,
            LogFormat::Compact => OutputFormat::Compact,
            LogFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the acquisition core against the synthetic source
    Record {
        /// How long to drive the source
        #[arg(long, default_value = "5")]
        duration_secs: f64,

        /// Samples per delivery (defaults to radio.max_burst_size)
        #[arg(long)]
        burst: Option<usize>,

        /// Pace deliveries to the configured sample rate
        #[arg(long)]
        realtime: bool,

        /// Print the burst summary as JSON on stdout
        #[arg(long)]
        stats_json: bool,
    },

    /// Load and validate the configuration, then print the resolved values
    CheckConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SounderConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    logging::init(&config, cli.log_format.into()).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Record {
            duration_secs,
            burst,
            realtime,
            stats_json,
        } => record(config, duration_secs, burst, realtime, stats_json),
        Commands::CheckConfig => check_config(&config),
    }
}

fn record(
    config: SounderConfig,
    duration_secs: f64,
    burst: Option<usize>,
    realtime: bool,
    stats_json: bool,
) -> Result<()> {
    let duration = Duration::try_from_secs_f64(duration_secs)
        .with_context(|| format!("Invalid duration: {duration_secs} s"))?;
    let burst = burst.unwrap_or(config.radio.max_burst_size);
    let sample_rate = config.radio.sample_rate;

    let mut sounder = Sounder::new(config).context("Failed to initialize sounder")?;
    let mut source = SyntheticSource::new(burst);
    if realtime {
        source = source.paced(sample_rate);
    }

    info!(burst, realtime, "Recording");
    let stop = Arc::new(AtomicBool::new(false));
    let summary = sounder
        .run_burst(&mut source, duration, stop)
        .context("Burst failed")?;

    if stats_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for snapshot in &summary.stats {
            println!("{snapshot}");
        }
        println!(
            "{} measurement files written to {}",
            summary.files_written,
            sounder.save_path().display()
        );
    }
    Ok(())
}

fn check_config(config: &SounderConfig) -> Result<()> {
    config.validate().context("Configuration is invalid")?;
    let resolved = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{resolved}");
    info!("Configuration is valid");
    Ok(())
}
