//! Radio front-end seam
//!
//! The acquisition core does not talk to hardware itself. A [`SampleSource`] stands in
//! for the radio driver: it is asked to fill the rx write view once per delivery and
//! to consume from the tx read view once per transmit request.
//!
//! # Available Sources
//!
//! - `SyntheticSource` - Counting byte pattern, optionally paced to the sample rate

use crate::data::{TxSlots, WriteSlots};
use crate::error::AppResult;
use std::thread;
use std::time::{Duration, Instant};

/// Driver-side interface of the radio front end.
pub trait SampleSource: Send {
    /// Fill `slots` with at most `slots.capacity()` samples per channel.
    ///
    /// Returns the number of samples written per channel.
    fn receive(&mut self, slots: &mut WriteSlots<'_>) -> AppResult<usize>;

    /// Consume samples from the transmit view.
    ///
    /// Returns the number of samples per channel taken. Receive-only sources keep the
    /// default, which takes nothing.
    fn transmit(&mut self, _slots: &TxSlots<'_>) -> AppResult<usize> {
        Ok(0)
    }
}

// =============================================================================
// SyntheticSource - Counting Pattern Generator
// =============================================================================

/// Synthetic front end producing a deterministic byte ramp.
///
/// Byte `i` of the stream on channel `ch` is `(i + ch) mod 256`, so the position of
/// any captured byte can be recovered from its value. With a sample rate set, each
/// delivery sleeps until the stream is no further ahead than real time.
#[derive(Debug)]
pub struct SyntheticSource {
    burst: usize,
    /// Bytes produced per channel so far
    position: u64,
    pacing: Option<Pacing>,
}

#[derive(Debug)]
struct Pacing {
    sample_rate: u64,
    started: Option<Instant>,
    samples: u64,
}

impl SyntheticSource {
    /// Source delivering `burst` samples per call, as fast as possible.
    pub fn new(burst: usize) -> Self {
        Self {
            burst,
            position: 0,
            pacing: None,
        }
    }

    /// Pace deliveries to `sample_rate` samples per second.
    pub fn paced(mut self, sample_rate: u64) -> Self {
        self.pacing = Some(Pacing {
            sample_rate,
            started: None,
            samples: 0,
        });
        self
    }

    /// Samples per delivery.
    pub fn burst(&self) -> usize {
        self.burst
    }

    /// Expected value of byte `index` of channel `ch`.
    pub fn byte_at(ch: usize, index: u64) -> u8 {
        (index.wrapping_add(ch as u64) % 256) as u8
    }

    fn wait_for_slot(&mut self, samples: usize) {
        let Some(pacing) = self.pacing.as_mut() else {
            return;
        };
        let started = *pacing.started.get_or_insert_with(Instant::now);
        pacing.samples += samples as u64;
        let due = Duration::from_secs_f64(pacing.samples as f64 / pacing.sample_rate as f64);
        let elapsed = started.elapsed();
        if due > elapsed {
            thread::sleep(due - elapsed);
        }
    }
}

impl SampleSource for SyntheticSource {
    fn receive(&mut self, slots: &mut WriteSlots<'_>) -> AppResult<usize> {
        let samples = self.burst.min(slots.capacity());
        let bytes = samples * slots.sample_width();
        for ch in 0..slots.channel_count() {
            let position = self.position;
            for (i, byte) in slots.channel_mut(ch)[..bytes].iter_mut().enumerate() {
                *byte = Self::byte_at(ch, position + i as u64);
            }
        }
        self.position += bytes as u64;
        self.wait_for_slot(samples);
        Ok(samples)
    }

    fn transmit(&mut self, slots: &TxSlots<'_>) -> AppResult<usize> {
        Ok(self.burst.min(slots.samples()))
    }
}
