//! Measurement windowing and persistence.
//!
//! The measurement pipeline sits behind the rx ring. Its producer is the
//! [`MeasurementExtractor`], running on the rx worker thread, which cuts windows out
//! of each filled rx buffer. Its consumer is the [`SaveWorker`], which writes every
//! completed save buffer to disk. Both ends share one [`MeasurementFifo`].

pub mod extractor;
pub mod save_worker;

pub use extractor::{MeasurementExtractor, Phase, WindowGeometry, WindowState};
pub use save_worker::{measurement_file_name, SaveWorker};

use crate::data::{ChannelBuffers, DoubleBuffer};
use crate::stats::Stats;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Double-buffered save area shared by the extractor and the save worker.
#[derive(Debug)]
pub struct MeasurementFifo {
    buffers: DoubleBuffer<ChannelBuffers>,
    geometry: WindowGeometry,
    stats: Stats,
}

impl MeasurementFifo {
    /// Allocate both save buffers, each holding one file worth of windows.
    pub fn new(
        channels: usize,
        sample_width: usize,
        geometry: WindowGeometry,
        stats_enabled: bool,
    ) -> Self {
        let file_samples = geometry.file_samples();
        Self {
            buffers: DoubleBuffer::from_fn(|| {
                ChannelBuffers::new(channels, sample_width, file_samples)
            }),
            geometry,
            stats: Stats::new("FIFO", stats_enabled),
        }
    }

    /// The save buffers.
    pub fn buffers(&self) -> &DoubleBuffer<ChannelBuffers> {
        &self.buffers
    }

    /// Window layout.
    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    /// Counters of this pipeline.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Build both ends of the measurement pipeline around one shared fifo.
pub fn measurement_pipeline(
    channels: usize,
    sample_width: usize,
    geometry: WindowGeometry,
    save_path: impl Into<PathBuf>,
    stats_enabled: bool,
) -> (MeasurementExtractor, SaveWorker) {
    let fifo = Arc::new(MeasurementFifo::new(
        channels,
        sample_width,
        geometry,
        stats_enabled,
    ));
    log_measurement_sizes(channels, sample_width, &geometry);

    (
        MeasurementExtractor::new(Arc::clone(&fifo)),
        SaveWorker::new(fifo, save_path),
    )
}

fn log_measurement_sizes(channels: usize, sample_width: usize, geometry: &WindowGeometry) {
    let measurement_bytes = (channels * geometry.window_length * sample_width) as u64;
    let per_file_bytes = measurement_bytes * geometry.windows_per_file as u64;
    info!(
        channels,
        sample_width,
        window_length = geometry.window_length,
        period_length = geometry.period_length,
        gap_length = geometry.gap_length(),
        windows_per_file = geometry.windows_per_file,
        measurement_bytes,
        per_file_bytes,
        "Measurement FIFO initialized"
    );
    if let Some(per_second) = geometry.windows_per_second {
        let per_second_bytes = measurement_bytes * per_second;
        info!(
            per_second_bytes,
            per_minute_bytes = per_second_bytes * 60,
            "Measurement data rate"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_buffers_hold_one_file() {
        let geometry = WindowGeometry::new(500, 1_000, 10).unwrap();
        let fifo = MeasurementFifo::new(2, 4, geometry, true);
        let bytes = fifo.buffers().with_writable(|b| b.bytes_per_channel());
        assert_eq!(bytes, 10 * 500 * 4);
    }
}
