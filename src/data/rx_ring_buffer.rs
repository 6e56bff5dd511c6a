//! Double-buffered receive staging area.
//!
//! The radio driver writes every delivery straight into the writable half of a
//! [`DoubleBuffer`]. Once `capacity` samples have accumulated the half is handed to
//! the rx worker, which runs the [`MeasurementExtractor`] over it, and the driver
//! continues in the other half.
//!
//! Each half holds `capacity + 2 * max_burst` samples per channel. A write always
//! starts below `capacity` and is at most `max_burst` long, so the delivery that
//! crosses the threshold still fits entirely in the half it started in.
//!
//! If the worker is still busy with the previous half when the next one fills up,
//! the producer starts over at the beginning of its current half. That data is lost;
//! the loss is counted and the producer never waits.

use crate::config::SounderConfig;
use crate::data::channel_buffers::ChannelBuffers;
use crate::data::double_buffer::{BufferRole, DoubleBuffer, HandoffOutcome};
use crate::data::DEFAULT_WAIT_TIMEOUT;
use crate::error::{AppResult, SounderError};
use crate::measurement::MeasurementExtractor;
use crate::stats::Stats;
use parking_lot::MutexGuard;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// What a producer-side call did with the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Stored; the writable half is not full yet.
    Buffered,
    /// The given half filled up and was handed to the worker.
    HandedOff(BufferRole),
    /// The half filled up while the worker was busy; it will be overwritten.
    Dropped,
}

impl From<HandoffOutcome> for FeedOutcome {
    fn from(value: HandoffOutcome) -> Self {
        match value {
            HandoffOutcome::HandedOff(role) => FeedOutcome::HandedOff(role),
            HandoffOutcome::Dropped => FeedOutcome::Dropped,
        }
    }
}

/// Receive ring shared between the driver thread and the rx worker.
#[derive(Debug)]
pub struct RxRingBuffer {
    buffers: DoubleBuffer<ChannelBuffers>,
    sample_width: usize,
    max_burst: usize,
    capacity: usize,
    /// Samples in the writable half. Producer only.
    filled: AtomicUsize,
    stats: Stats,
}

/// Per-channel write view for exactly one delivery.
///
/// Holds the writable half locked until [`commit`](WriteSlots::commit); the worker
/// never touches that half, so the lock is uncontended.
pub struct WriteSlots<'a> {
    ring: &'a RxRingBuffer,
    slot: MutexGuard<'a, ChannelBuffers>,
    offset: usize,
}

impl RxRingBuffer {
    /// Allocate both halves.
    ///
    /// Fails if the sample width, the burst size or the capacity is zero.
    pub fn new(
        channels: usize,
        sample_width: usize,
        max_burst: usize,
        capacity: usize,
        stats_enabled: bool,
    ) -> AppResult<Self> {
        if sample_width == 0 || max_burst == 0 || capacity == 0 {
            return Err(SounderError::Configuration(format!(
                "rx ring needs a positive sample width, burst size and capacity \
                 (got {} bytes, {} samples, {} samples)",
                sample_width, max_burst, capacity
            )));
        }

        let samples_per_half = capacity + 2 * max_burst;
        info!(
            channels,
            sample_width, max_burst, capacity, samples_per_half, "Ringbuffer RX initialized"
        );
        Ok(Self {
            buffers: DoubleBuffer::from_fn(|| {
                ChannelBuffers::new(channels, sample_width, samples_per_half)
            }),
            sample_width,
            max_burst,
            capacity,
            filled: AtomicUsize::new(0),
            stats: Stats::new("Ringbuffer RX", stats_enabled),
        })
    }

    /// Build from the loaded configuration.
    pub fn from_config(config: &SounderConfig) -> AppResult<Self> {
        Self::new(
            config.radio.channels,
            config.radio.bytes_per_sample,
            config.radio.max_burst_size,
            config.rx.buffer_capacity,
            config.diagnostics.stats_enabled,
        )
    }

    /// Borrow the region the driver should write its next delivery into.
    pub fn write_slots(&self) -> WriteSlots<'_> {
        WriteSlots {
            ring: self,
            slot: self.buffers.writable(),
            offset: self.filled.load(Ordering::Relaxed),
        }
    }

    /// Copy `samples` samples per channel from `block` into the ring.
    ///
    /// Deliveries longer than `max_burst` are stored in `max_burst` chunks. Returns the
    /// last handoff outcome of this call, or [`FeedOutcome::Buffered`].
    pub fn feed<C: AsRef<[u8]>>(&self, block: &[C], samples: usize) -> FeedOutcome {
        let mut outcome = FeedOutcome::Buffered;
        let mut consumed = 0;
        while consumed < samples {
            let chunk = (samples - consumed).min(self.max_burst);
            let offset = self.filled.load(Ordering::Relaxed);
            self.buffers
                .with_writable(|buf| buf.copy_from(block, consumed, offset, chunk));
            consumed += chunk;

            match self.advance(chunk) {
                FeedOutcome::Buffered => {}
                other => outcome = other,
            }
        }
        outcome
    }

    fn advance(&self, samples: usize) -> FeedOutcome {
        self.stats.record_samples(samples);
        let filled = self.filled.load(Ordering::Relaxed) + samples;
        if filled < self.capacity {
            self.filled.store(filled, Ordering::Relaxed);
            return FeedOutcome::Buffered;
        }

        self.stats.record_full();
        self.filled.store(0, Ordering::Relaxed);
        let outcome = self.buffers.try_hand_off(filled);
        if outcome == HandoffOutcome::Dropped {
            self.stats.record_dropped();
            debug!(filled, "Rx worker busy, overwriting rx buffer");
        }
        outcome.into()
    }

    /// Run the rx worker until `stop` is set, feeding each handed-off half to
    /// `extractor`.
    pub fn process_loop(&self, extractor: &mut MeasurementExtractor, stop: &AtomicBool) {
        info!("Rx worker started");
        while !stop.load(Ordering::Relaxed) {
            self.process_next(extractor, stop, DEFAULT_WAIT_TIMEOUT);
        }
        info!("Rx worker stopped");
    }

    /// Wait for one filled half and run the extractor over it.
    ///
    /// Returns `false` if `stop` was observed with nothing pending.
    pub fn process_next(
        &self,
        extractor: &mut MeasurementExtractor,
        stop: &AtomicBool,
        timeout: Duration,
    ) -> bool {
        self.buffers
            .wait_and_consume(
                timeout,
                || stop.load(Ordering::Relaxed),
                || self.stats.record_wait(),
                |buffer, samples| {
                    self.stats.record_executed();
                    extractor.feed(buffer.as_slices(), samples);
                },
            )
            .is_some()
    }

    /// Samples per channel that trigger a handoff.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest single delivery, in samples.
    pub fn max_burst(&self) -> usize {
        self.max_burst
    }

    /// Samples currently in the writable half.
    pub fn filled(&self) -> usize {
        self.filled.load(Ordering::Relaxed)
    }

    /// The half the driver is writing.
    pub fn writing(&self) -> BufferRole {
        self.buffers.writing()
    }

    /// The underlying halves.
    pub fn buffers(&self) -> &DoubleBuffer<ChannelBuffers> {
        &self.buffers
    }

    /// Counters of this ring.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl<'a> WriteSlots<'a> {
    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.slot.channel_count()
    }

    /// Samples the driver may write into every channel.
    pub fn capacity(&self) -> usize {
        self.ring.max_burst
    }

    /// Bytes per sample.
    pub fn sample_width(&self) -> usize {
        self.ring.sample_width
    }

    /// Write position of this delivery, in samples from the start of the half.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Writable bytes of one channel for this delivery.
    pub fn channel_mut(&mut self, ch: usize) -> &mut [u8] {
        let width = self.ring.sample_width;
        let start = self.offset * width;
        let end = start + self.ring.max_burst * width;
        &mut self.slot.channel_mut(ch)[start..end]
    }

    /// Release the view after the driver wrote `samples` samples per channel.
    pub fn commit(self, samples: usize) -> FeedOutcome {
        let WriteSlots { ring, slot, .. } = self;
        drop(slot);
        ring.advance(samples.min(ring.max_burst))
    }
}
