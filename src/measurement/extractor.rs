//! Measurement window state machine.
//!
//! The sounder repeats a measurement every `period_length` samples. Only the first
//! `window_length` samples of each period are kept; the rest is the gap and is
//! skipped. The extractor walks every rx buffer through two phases:
//!
//! ```text
//!   |<------ window_length ------>|<------------- gap_length ------------->|
//!   [ Collecting: copy to save    ][ Gap: skip                              ]
//! ```
//!
//! A single delivery may end mid-window, span a whole gap, or cross several periods.
//! [`MeasurementExtractor::feed`] therefore loops "which phase, how many samples until
//! its boundary" until the delivery is used up. The phase changes exactly when its
//! offset reaches the phase length, so feeding a range in one call or one sample at
//! a time ends in the same state.

use super::MeasurementFifo;
use crate::config::SounderConfig;
use crate::data::HandoffOutcome;
use crate::error::{AppResult, SounderError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lengths, in samples, describing the measurement schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    /// Samples kept at the start of each period
    pub window_length: usize,
    /// Samples from one window start to the next
    pub period_length: usize,
    /// Windows per save buffer (and per file)
    pub windows_per_file: usize,
    /// Measurement repetition rate, when known; only used for reporting
    pub windows_per_second: Option<u64>,
}

impl WindowGeometry {
    /// Validate and build a schedule.
    pub fn new(
        window_length: usize,
        period_length: usize,
        windows_per_file: usize,
    ) -> AppResult<Self> {
        if window_length == 0 || windows_per_file == 0 {
            return Err(SounderError::Configuration(
                "window_length and windows_per_file must be positive".into(),
            ));
        }
        if period_length < window_length {
            return Err(SounderError::Configuration(format!(
                "period of {} samples is shorter than the {}-sample window",
                period_length, window_length
            )));
        }
        Ok(Self {
            window_length,
            period_length,
            windows_per_file,
            windows_per_second: None,
        })
    }

    /// Derive the schedule from the configuration.
    pub fn from_config(config: &SounderConfig) -> AppResult<Self> {
        let m = &config.measurement;
        let mut geometry = Self::new(
            m.window_length,
            m.samples_per_period(config.radio.sample_rate),
            m.windows_per_file,
        )?;
        geometry.windows_per_second = Some(m.per_second);
        Ok(geometry)
    }

    /// Samples skipped between two windows.
    pub fn gap_length(&self) -> usize {
        self.period_length - self.window_length
    }

    /// Samples per channel in one save buffer.
    pub fn file_samples(&self) -> usize {
        self.windows_per_file * self.window_length
    }
}

/// Which part of the period the stream is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inside a measurement window
    Collecting,
    /// Between two windows
    Gap,
}

/// Position of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Current phase
    pub phase: Phase,
    /// Samples already spent in the current phase; always below the phase length
    pub offset: usize,
    /// Windows completed in the current save buffer
    pub windows_accumulated: usize,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            phase: Phase::Collecting,
            offset: 0,
            windows_accumulated: 0,
        }
    }
}

/// Producer side of the measurement pipeline.
#[derive(Debug)]
pub struct MeasurementExtractor {
    fifo: Arc<MeasurementFifo>,
    state: WindowState,
}

impl MeasurementExtractor {
    pub(crate) fn new(fifo: Arc<MeasurementFifo>) -> Self {
        Self {
            fifo,
            state: WindowState::default(),
        }
    }

    /// Consume exactly `samples` samples per channel from `block`.
    ///
    /// Never blocks. Returns the outcome of the last save-buffer handoff attempted
    /// during this call, if any.
    pub fn feed<C: AsRef<[u8]>>(&mut self, block: &[C], samples: usize) -> Option<HandoffOutcome> {
        let geometry = *self.fifo.geometry();
        let gap_length = geometry.gap_length();
        self.fifo.stats().record_samples(samples);

        let mut last_handoff = None;
        let mut consumed = 0;
        while consumed < samples {
            let remaining = samples - consumed;
            match self.state.phase {
                Phase::Collecting => {
                    let take = (geometry.window_length - self.state.offset).min(remaining);
                    let dst = self.state.windows_accumulated * geometry.window_length
                        + self.state.offset;
                    self.fifo
                        .buffers()
                        .with_writable(|save| save.copy_from(block, consumed, dst, take));

                    self.state.offset += take;
                    consumed += take;

                    if self.state.offset == geometry.window_length {
                        if let Some(outcome) = self.complete_window(&geometry) {
                            last_handoff = Some(outcome);
                        }
                    }
                }
                Phase::Gap => {
                    let skip = (gap_length - self.state.offset).min(remaining);
                    self.state.offset += skip;
                    consumed += skip;

                    if self.state.offset == gap_length {
                        self.state.phase = Phase::Collecting;
                        self.state.offset = 0;
                    }
                }
            }
        }
        last_handoff
    }

    fn complete_window(&mut self, geometry: &WindowGeometry) -> Option<HandoffOutcome> {
        self.state.windows_accumulated += 1;
        self.state.offset = 0;
        self.state.phase = if geometry.gap_length() == 0 {
            Phase::Collecting
        } else {
            Phase::Gap
        };

        if self.state.windows_accumulated < geometry.windows_per_file {
            return None;
        }
        self.state.windows_accumulated = 0;

        let stats = self.fifo.stats();
        stats.record_full();
        let outcome = self.fifo.buffers().try_hand_off(geometry.file_samples());
        match outcome {
            HandoffOutcome::HandedOff(role) => {
                debug!(?role, "Save buffer handed to save worker");
            }
            HandoffOutcome::Dropped => {
                stats.record_dropped();
                warn!("Save worker busy, overwriting save buffer");
            }
        }
        Some(outcome)
    }

    /// Current state machine position.
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// The fifo this extractor fills.
    pub fn fifo(&self) -> &Arc<MeasurementFifo> {
        &self.fifo
    }
}
