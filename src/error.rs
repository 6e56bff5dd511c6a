//! Custom error types for the acquisition core.
//!
//! `SounderError` is the single error type of the library. It is built with
//! `thiserror` and splits into two families:
//!
//! - **Start-up errors** (`Config`, `Configuration`, `UnsupportedSampleWidth`): reported
//!   once while a subsystem is constructed. The subsystem must not start with a
//!   broken configuration.
//! - **Persistence errors** (`Io`, `Persist`): raised by a single save cycle. The save
//!   worker logs them and moves on to the next buffer, so losing one file never stops
//!   acquisition.
//!
//! A worker thread that panics surfaces as `WorkerPanicked` when it is joined.
//!
//! Dropped buffers under overload are *not* errors. They are reported through
//! [`HandoffOutcome::Dropped`](crate::data::HandoffOutcome) and counted in the stats block.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type AppResult<T> = std::result::Result<T, SounderError>;

/// Errors raised while building or running the acquisition core.
#[derive(Error, Debug)]
pub enum SounderError {
    /// The layered configuration could not be read or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A configuration value is out of range or inconsistent with another.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// `radio.bytes_per_sample` names no known sample format.
    #[error("Unsupported sample width: {0} bytes (expected 4 for sc16 or 8 for fc32)")]
    UnsupportedSampleWidth(usize),

    /// I/O failure not tied to one output file, such as a driver read behind a
    /// [`SampleSource`](crate::source::SampleSource).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing one output file failed.
    #[error("Failed to persist {}: {source}", path.display())]
    Persist {
        /// File that was being written
        path: PathBuf,
        /// Underlying write error
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked; carries the thread name.
    #[error("Worker thread '{0}' panicked")]
    WorkerPanicked(String),
}

impl From<figment::Error> for SounderError {
    fn from(value: figment::Error) -> Self {
        SounderError::Config(Box::new(value))
    }
}

impl SounderError {
    /// Whether the pipeline can keep running after this error.
    ///
    /// Only persistence failures are local to one save cycle.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SounderError::Io(_) | SounderError::Persist { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_errors_are_recoverable() {
        let err = SounderError::Persist {
            path: PathBuf::from("/data/ch_measurement_0000000001.bin"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("ch_measurement_0000000001.bin"));
    }

    #[test]
    fn configuration_errors_are_fatal() {
        assert!(!SounderError::UnsupportedSampleWidth(6).is_recoverable());
        assert!(!SounderError::Configuration("window_length is zero".into()).is_recoverable());
    }

    #[test]
    fn sample_width_message_names_supported_widths() {
        let msg = SounderError::UnsupportedSampleWidth(2).to_string();
        assert!(msg.contains("2 bytes"));
        assert!(msg.contains("sc16"));
    }
}
