//! Background persistence of completed save buffers.

use super::MeasurementFifo;
use crate::data::{ChannelBuffers, DEFAULT_WAIT_TIMEOUT};
use crate::error::{AppResult, SounderError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// `ch_measurement_<seq>.bin`, sequence zero-padded to ten digits.
pub fn measurement_file_name(sequence: u64) -> String {
    format!("ch_measurement_{:010}.bin", sequence)
}

/// Consumer side of the measurement pipeline.
///
/// Owns the file sequence counter; it only ever grows during a run.
#[derive(Debug)]
pub struct SaveWorker {
    fifo: Arc<MeasurementFifo>,
    save_path: PathBuf,
    sequence: u64,
}

impl SaveWorker {
    pub(crate) fn new(fifo: Arc<MeasurementFifo>, save_path: impl Into<PathBuf>) -> Self {
        Self {
            fifo,
            save_path: save_path.into(),
            sequence: 0,
        }
    }

    /// Persist save buffers until `stop` is set.
    ///
    /// A failed write is logged and counted; the loop carries on with the next buffer.
    pub fn run(&mut self, stop: &AtomicBool) {
        info!(save_path = %self.save_path.display(), "Save worker started");
        while !stop.load(Ordering::Relaxed) {
            self.save_next(stop, DEFAULT_WAIT_TIMEOUT);
        }
        info!(files = self.sequence, "Save worker stopped");
    }

    /// Wait for one save buffer and write it.
    ///
    /// Returns `None` if `stop` was observed while nothing was pending, otherwise the
    /// result of this single save cycle.
    pub fn save_next(
        &mut self,
        stop: &AtomicBool,
        timeout: Duration,
    ) -> Option<AppResult<PathBuf>> {
        let fifo = &self.fifo;
        let dir = &self.save_path;
        let sequence = &mut self.sequence;

        let result = fifo.buffers().wait_and_consume(
            timeout,
            || stop.load(Ordering::Relaxed),
            || fifo.stats().record_wait(),
            |buffer, _samples| {
                fifo.stats().record_executed();
                let path = dir.join(measurement_file_name(*sequence));
                *sequence += 1;
                write_measurement(&path, buffer).map(|()| path)
            },
        )?;

        match &result {
            Ok(path) => debug!(path = %path.display(), "Measurement file written"),
            Err(e) => {
                fifo.stats().record_write_error();
                warn!(error = %e, "Failed to save measurement file, continuing");
            }
        }
        Some(result)
    }

    /// Sequence number the next file will get.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Output directory.
    pub fn save_path(&self) -> &Path {
        &self.save_path
    }
}

fn write_measurement(path: &Path, buffer: &ChannelBuffers) -> AppResult<()> {
    let persist = |source| SounderError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(persist)?;
    buffer.write_to(BufWriter::new(file)).map_err(persist)
}
