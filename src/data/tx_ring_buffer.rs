//! Precomputed transmit ring.
//!
//! The transmit path repeats one waveform cycle forever. The cycle is encoded once
//! at construction, repeated `max_burst / cycle + 2` times, and never touched again;
//! the sink only needs a cursor into it. Because any cursor position is below one
//! cycle, a view starting there always holds at least `max_burst` valid samples.
//!
//! Single-threaded by construction: only the thread driving the radio calls
//! [`TxRingBuffer::read_slots`].

use crate::config::SounderConfig;
use crate::data::channel_buffers::ChannelBuffers;
use crate::data::waveform::{SampleFormat, Waveform};
use crate::error::{AppResult, SounderError};
use crate::stats::Stats;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the reference dump of the transmit buffer.
pub const SEQUENCE_FILE_NAME: &str = "seq.bin";

/// Repeating transmit waveform with a rotating read cursor.
#[derive(Debug)]
pub struct TxRingBuffer {
    format: SampleFormat,
    cycle_len: usize,
    repetitions: usize,
    buffers: ChannelBuffers,
    cursor: usize,
    stats: Stats,
}

/// Per-channel read view handed to the transmit sink for one request.
#[derive(Debug, Clone, Copy)]
pub struct TxSlots<'a> {
    buffers: &'a ChannelBuffers,
    cursor: usize,
}

impl TxRingBuffer {
    /// Precompute the transmit buffer.
    ///
    /// Fails if `sample_width` is not a known encoding or the cycle is empty.
    pub fn new(
        channels: usize,
        sample_width: usize,
        max_burst: usize,
        sample_rate: u64,
        waveform: Waveform,
        stats_enabled: bool,
    ) -> AppResult<Self> {
        let format = SampleFormat::from_width(sample_width)?;
        let cycles = waveform.generate(channels, sample_rate)?;
        let cycle_len = waveform.cycle_length(sample_rate)?;
        let repetitions = max_burst / cycle_len + 2;

        let mut buffers = ChannelBuffers::new(channels, format.width(), repetitions * cycle_len);
        for (ch, cycle) in cycles.iter().enumerate() {
            let bytes = buffers.channel_mut(ch);
            for (j, sample) in bytes.chunks_exact_mut(format.width()).enumerate() {
                let (re, im) = cycle[j % cycle_len];
                format.encode(re, im, sample);
            }
        }

        info!(
            channels,
            sample_width,
            max_burst,
            sample_rate,
            ?waveform,
            cycle_len,
            repetitions,
            bytes_per_channel = buffers.bytes_per_channel(),
            "Ringbuffer TX initialized"
        );

        Ok(Self {
            format,
            cycle_len,
            repetitions,
            buffers,
            cursor: 0,
            stats: Stats::new("Ringbuffer TX", stats_enabled),
        })
    }

    /// Build from the loaded configuration.
    pub fn from_config(config: &SounderConfig) -> AppResult<Self> {
        Self::new(
            config.radio.channels,
            config.radio.bytes_per_sample,
            config.radio.max_burst_size,
            config.radio.sample_rate,
            config.tx.waveform(),
            config.diagnostics.stats_enabled,
        )
    }

    /// Advance past `new_samples` already consumed by the sink and return the view
    /// the sink reads next. Call once with 0 to get the initial view.
    pub fn read_slots(&mut self, new_samples: usize) -> TxSlots<'_> {
        self.stats.record_samples(new_samples);
        self.cursor = (self.cursor + new_samples % self.cycle_len) % self.cycle_len;
        TxSlots {
            buffers: &self.buffers,
            cursor: self.cursor,
        }
    }

    /// Write the full precomputed buffer to `dir/seq.bin`.
    pub fn save_reference(&self, dir: &Path) -> AppResult<PathBuf> {
        let path = dir.join(SEQUENCE_FILE_NAME);
        let persist = |source| SounderError::Persist {
            path: path.clone(),
            source,
        };
        let file = File::create(&path).map_err(persist)?;
        self.buffers.write_to(BufWriter::new(file)).map_err(persist)?;
        info!(path = %path.display(), "Transmit sequence saved");
        Ok(path)
    }

    /// Sample encoding.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Samples in one waveform cycle.
    pub fn cycle_length(&self) -> usize {
        self.cycle_len
    }

    /// How many cycles the buffer holds.
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Current cursor, in samples, always below one cycle.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The precomputed buffer.
    pub fn buffers(&self) -> &ChannelBuffers {
        &self.buffers
    }

    /// Counters of this ring.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl<'a> TxSlots<'a> {
    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.buffers.channel_count()
    }

    /// Cursor this view starts at, in samples.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes the sink may read from one channel, starting at the cursor.
    pub fn channel(&self, ch: usize) -> &'a [u8] {
        let start = self.cursor * self.buffers.sample_width();
        &self.buffers.channel(ch)[start..]
    }

    /// Samples available in every channel view.
    pub fn samples(&self) -> usize {
        self.buffers.samples_per_channel() - self.cursor
    }
}
