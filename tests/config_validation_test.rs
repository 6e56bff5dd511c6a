//! Tests for configuration loading and validation.

use channel_sounder::config::{SounderConfig, WaveformKind};
use channel_sounder::SounderError;
use std::io::Write;

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = SounderConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.radio.sample_rate, 25_000_000);
    assert_eq!(config.rx.buffer_capacity, 1_000_000);
    config.validate().unwrap();
}

#[test]
fn test_shipped_default_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
    let config = SounderConfig::load_from(path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.tx.waveform, WaveformKind::Sine);
    assert_eq!(config.measurement.windows_per_file, 10_000);
}

#[test]
fn test_file_values_override_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [radio]
        channels = 2
        sample_rate = 8000000

        [storage]
        save_path = "/tmp/sounder"
        "#
    )
    .unwrap();

    let config = SounderConfig::load_from(file.path()).unwrap();
    assert_eq!(config.radio.channels, 2);
    assert_eq!(config.radio.sample_rate, 8_000_000);
    assert_eq!(config.storage.save_path.to_str(), Some("/tmp/sounder"));
    assert_eq!(config.radio.max_burst_size, 2_000);
}

#[test]
fn test_malformed_toml_is_a_config_error() {
    let result = SounderConfig::from_toml_str("[radio\nchannels = 2");
    assert!(matches!(result, Err(SounderError::Config(_))));
}

#[test]
fn test_unknown_waveform_rejected() {
    let result = SounderConfig::from_toml_str("[tx]\nwaveform = \"chirp\"");
    assert!(result.is_err());
}

#[test]
fn test_zero_channels_rejected() {
    let mut config = SounderConfig::default();
    config.radio.channels = 0;
    let err_msg = config.validate().unwrap_err().to_string();
    assert!(err_msg.contains("radio.channels"));
}

#[test]
fn test_window_longer_than_period_rejected() {
    let mut config = SounderConfig::default();
    config.measurement.per_second = 100_000;
    config.measurement.window_length = 500;
    let err = config.validate().unwrap_err();
    assert!(!err.is_recoverable());
    assert!(err.to_string().contains("does not fit"));
}

#[test]
fn test_empty_save_path_rejected() {
    let mut config = SounderConfig::default();
    config.storage.save_path = Default::default();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_log_level_rejected() {
    let mut config = SounderConfig::default();
    config.application.log_level = "verbose".into();
    let err_msg = config.validate().unwrap_err().to_string();
    assert!(err_msg.contains("Invalid log_level"));
}
