//! Configuration loading using Figment.
//!
//! Configuration is merged from three layers, later layers winning:
//! 1. Built-in defaults (the values the instrument was commissioned with)
//! 2. A TOML file
//! 3. Environment variables prefixed with `CHANNEL_SOUNDER_`, using `__` between
//!    section and key (e.g. `CHANNEL_SOUNDER_RADIO__SAMPLE_RATE=25000000`)
//!
//! The configuration is consumed once at start-up; nothing re-reads it while a burst
//! is running.
//!
//! # Example
//! ```no_run
//! use channel_sounder::config::SounderConfig;
//!
//! let config = SounderConfig::load_from("config/default.toml")?;
//! config.validate()?;
//! println!("{} channels at {} S/s", config.radio.channels, config.radio.sample_rate);
//! # Ok::<(), channel_sounder::error::SounderError>(())
//! ```

use crate::data::waveform::{SampleFormat, Waveform};
use crate::error::{AppResult, SounderError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SounderConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Front-end stream parameters shared by the rx and tx paths
    #[serde(default)]
    pub radio: RadioConfig,
    /// Receive ring buffer sizing
    #[serde(default)]
    pub rx: RxConfig,
    /// Measurement windowing
    #[serde(default)]
    pub measurement: MeasurementConfig,
    /// Transmit waveform
    #[serde(default)]
    pub tx: TxConfig,
    /// Output location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Statistics collection
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Radio front-end parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Number of antenna streams
    #[serde(default = "default_channels")]
    pub channels: usize,
    /// Bytes per complex sample (4 = sc16, 8 = fc32)
    #[serde(default = "default_bytes_per_sample")]
    pub bytes_per_sample: usize,
    /// Sample rate in S/s
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u64,
    /// Largest single delivery the driver hands over, in samples
    #[serde(default = "default_max_burst_size")]
    pub max_burst_size: usize,
}

/// Receive ring buffer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RxConfig {
    /// Samples per channel collected before a buffer is handed to the extractor
    #[serde(default = "default_rx_capacity")]
    pub buffer_capacity: usize,
}

/// Measurement windowing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Samples captured at the start of every repetition period
    #[serde(default = "default_window_length")]
    pub window_length: usize,
    /// Repetition rate of the sounder in measurements per second
    #[serde(default = "default_per_second")]
    pub per_second: u64,
    /// Windows accumulated before a file is written (the save period)
    #[serde(default = "default_windows_per_file")]
    pub windows_per_file: usize,
}

/// Transmit waveform kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformKind {
    /// Complex tone, shifted per channel
    Sine,
    /// Fixed-length random +/-1 pattern
    PlusMinusOne,
}

/// Transmit waveform parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxConfig {
    /// Which waveform to precompute
    #[serde(default = "default_waveform")]
    pub waveform: WaveformKind,
    /// Base tone frequency in Hz (sine only)
    #[serde(default = "default_tone_hz")]
    pub tone_hz: u64,
    /// Pattern length in samples (+/-1 only)
    #[serde(default = "default_pattern_length")]
    pub pattern_length: usize,
    /// RNG seed (+/-1 only)
    #[serde(default)]
    pub seed: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory receiving `ch_measurement_*.bin` and `seq.bin`
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
}

/// Statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Collect counters on the hot paths
    #[serde(default = "default_stats_enabled")]
    pub stats_enabled: bool,
}

// Default value functions
fn default_name() -> String {
    "Channel Sounder".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_channels() -> usize {
    1
}

fn default_bytes_per_sample() -> usize {
    4
}

fn default_sample_rate() -> u64 {
    25_000_000
}

fn default_max_burst_size() -> usize {
    2_000
}

fn default_rx_capacity() -> usize {
    1_000_000
}

fn default_window_length() -> usize {
    500
}

fn default_per_second() -> u64 {
    1_000
}

fn default_windows_per_file() -> usize {
    10_000
}

fn default_waveform() -> WaveformKind {
    WaveformKind::Sine
}

fn default_tone_hz() -> u64 {
    1_000_000
}

fn default_pattern_length() -> usize {
    4_000
}

fn default_save_path() -> PathBuf {
    PathBuf::from("data")
}

fn default_stats_enabled() -> bool {
    true
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            bytes_per_sample: default_bytes_per_sample(),
            sample_rate: default_sample_rate(),
            max_burst_size: default_max_burst_size(),
        }
    }
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_rx_capacity(),
        }
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            window_length: default_window_length(),
            per_second: default_per_second(),
            windows_per_file: default_windows_per_file(),
        }
    }
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            waveform: default_waveform(),
            tone_hz: default_tone_hz(),
            pattern_length: default_pattern_length(),
            seed: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            stats_enabled: default_stats_enabled(),
        }
    }
}

impl MeasurementConfig {
    /// Samples between the starts of two consecutive windows.
    pub fn samples_per_period(&self, sample_rate: u64) -> usize {
        if self.per_second == 0 {
            return 0;
        }
        (sample_rate / self.per_second) as usize
    }
}

impl TxConfig {
    /// Resolve the configured waveform.
    pub fn waveform(&self) -> Waveform {
        match self.waveform {
            WaveformKind::Sine => Waveform::Sine {
                tone_hz: self.tone_hz,
            },
            WaveformKind::PlusMinusOne => Waveform::PlusMinusOne {
                length: self.pattern_length,
                seed: self.seed,
            },
        }
    }
}

impl SounderConfig {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// A missing file is not an error; the defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CHANNEL_SOUNDER_").split("__"))
            .extract()?)
    }

    /// Parse configuration from a TOML string on top of the defaults.
    pub fn from_toml_str(toml: &str) -> AppResult<Self> {
        Ok(Self::figment().merge(Toml::string(toml)).extract()?)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(SounderConfig::default()))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(SounderError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let radio = &self.radio;
        if radio.channels == 0 {
            return Err(SounderError::Configuration(
                "radio.channels must be at least 1".into(),
            ));
        }
        SampleFormat::from_width(radio.bytes_per_sample)?;
        if radio.sample_rate == 0 {
            return Err(SounderError::Configuration(
                "radio.sample_rate must be positive".into(),
            ));
        }
        if radio.max_burst_size == 0 {
            return Err(SounderError::Configuration(
                "radio.max_burst_size must be positive".into(),
            ));
        }

        if self.rx.buffer_capacity == 0 {
            return Err(SounderError::Configuration(
                "rx.buffer_capacity must be positive".into(),
            ));
        }

        let m = &self.measurement;
        if m.window_length == 0 || m.per_second == 0 || m.windows_per_file == 0 {
            return Err(SounderError::Configuration(
                "measurement.window_length, per_second and windows_per_file must be positive"
                    .into(),
            ));
        }
        let period = m.samples_per_period(radio.sample_rate);
        if period < m.window_length {
            return Err(SounderError::Configuration(format!(
                "measurement window of {} samples does not fit into a period of {} samples \
                 ({} S/s at {} measurements/s)",
                m.window_length, period, radio.sample_rate, m.per_second
            )));
        }

        self.tx.waveform().cycle_length(radio.sample_rate)?;

        if self.storage.save_path.as_os_str().is_empty() {
            return Err(SounderError::Configuration(
                "storage.save_path must not be empty".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = SounderConfig::default();
        config.validate().unwrap();
        assert_eq!(config.measurement.samples_per_period(config.radio.sample_rate), 25_000);
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = SounderConfig::from_toml_str(
            r#"
            [radio]
            channels = 4
            bytes_per_sample = 8

            [measurement]
            windows_per_file = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.radio.channels, 4);
        assert_eq!(config.radio.bytes_per_sample, 8);
        assert_eq!(config.radio.sample_rate, 25_000_000);
        assert_eq!(config.measurement.windows_per_file, 10);
        assert_eq!(config.measurement.window_length, 500);
    }

    #[test]
    fn waveform_kind_parses_snake_case() {
        let config = SounderConfig::from_toml_str(
            r#"
            [tx]
            waveform = "plus_minus_one"
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(
            config.tx.waveform(),
            Waveform::PlusMinusOne {
                length: 4_000,
                seed: 7
            }
        );
    }

    #[test]
    fn rejects_unknown_sample_width() {
        let mut config = SounderConfig::default();
        config.radio.bytes_per_sample = 6;
        assert!(matches!(
            config.validate(),
            Err(SounderError::UnsupportedSampleWidth(6))
        ));
    }

    #[test]
    fn rejects_window_longer_than_period() {
        let mut config = SounderConfig::default();
        config.radio.sample_rate = 400_000;
        config.measurement.per_second = 1_000;
        config.measurement.window_length = 500;
        assert!(matches!(
            config.validate(),
            Err(SounderError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_tone_above_sample_rate() {
        let mut config = SounderConfig::default();
        config.radio.sample_rate = 500_000;
        config.measurement.window_length = 100;
        config.tx.tone_hz = 1_000_000;
        assert!(config.validate().is_err());
    }
}
