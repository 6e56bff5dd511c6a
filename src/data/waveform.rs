//! Transmit waveform generation and sample encodings.

use crate::error::{AppResult, SounderError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Full-scale factor for `sc16` samples.
pub const SCALE_SC16: f32 = 4096.0;
/// Full-scale factor for `fc32` samples.
pub const SCALE_FC32: f32 = 0.5;

/// Wire encoding of one complex sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Two native-endian `i16` (I, Q), 4 bytes
    Sc16,
    /// Two native-endian `f32` (I, Q), 8 bytes
    Fc32,
}

impl SampleFormat {
    /// Pick the encoding for a sample width in bytes.
    pub fn from_width(width: usize) -> AppResult<Self> {
        match width {
            4 => Ok(SampleFormat::Sc16),
            8 => Ok(SampleFormat::Fc32),
            other => Err(SounderError::UnsupportedSampleWidth(other)),
        }
    }

    /// Bytes per complex sample.
    pub fn width(self) -> usize {
        match self {
            SampleFormat::Sc16 => 4,
            SampleFormat::Fc32 => 8,
        }
    }

    /// Encode one sample into `out`, which must be exactly [`width`](Self::width) bytes.
    ///
    /// `sc16` truncates toward zero after scaling.
    pub fn encode(self, re: f32, im: f32, out: &mut [u8]) {
        match self {
            SampleFormat::Sc16 => {
                let i = (SCALE_SC16 * re) as i16;
                let q = (SCALE_SC16 * im) as i16;
                out[..2].copy_from_slice(&i.to_ne_bytes());
                out[2..4].copy_from_slice(&q.to_ne_bytes());
            }
            SampleFormat::Fc32 => {
                out[..4].copy_from_slice(&(SCALE_FC32 * re).to_ne_bytes());
                out[4..8].copy_from_slice(&(SCALE_FC32 * im).to_ne_bytes());
            }
        }
    }
}

/// One repeating transmit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// Complex tone; channel `n` transmits at `tone_hz * (n + 1)`.
    Sine {
        /// Base tone in Hz
        tone_hz: u64,
    },
    /// Random +/-1 in I and Q, reproducible from `seed`.
    PlusMinusOne {
        /// Cycle length in samples
        length: usize,
        /// RNG seed
        seed: u64,
    },
}

impl Waveform {
    /// Samples in one cycle at `sample_rate`.
    pub fn cycle_length(&self, sample_rate: u64) -> AppResult<usize> {
        let len = match *self {
            Waveform::Sine { tone_hz } => {
                if tone_hz == 0 {
                    return Err(SounderError::Configuration(
                        "tx.tone_hz must be positive".into(),
                    ));
                }
                (sample_rate / tone_hz) as usize
            }
            Waveform::PlusMinusOne { length, .. } => length,
        };
        if len == 0 {
            return Err(SounderError::Configuration(format!(
                "transmit cycle at {} S/s is empty ({:?})",
                sample_rate, self
            )));
        }
        Ok(len)
    }

    /// One cycle per channel as `(I, Q)` pairs in the range [-1, 1].
    pub fn generate(&self, channels: usize, sample_rate: u64) -> AppResult<Vec<Vec<(f32, f32)>>> {
        let len = self.cycle_length(sample_rate)?;
        let cycles: Vec<Vec<(f32, f32)>> = match *self {
            Waveform::Sine { tone_hz } => {
                let period = 1.0 / sample_rate as f64;
                (0..channels)
                    .map(|ch| {
                        let f = tone_hz as f64 * (ch as f64 + 1.0);
                        (0..len)
                            .map(|j| {
                                let phase = 2.0 * PI * f * period * j as f64;
                                (phase.cos() as f32, phase.sin() as f32)
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect()
            }
            Waveform::PlusMinusOne { seed, .. } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut sign = move || if rng.gen::<bool>() { 1.0f32 } else { -1.0 };
                (0..channels)
                    .map(|_| (0..len).map(|_| (sign(), sign())).collect::<Vec<_>>())
                    .collect()
            }
        };
        Ok(cycles)
    }
}
