//! Acquisition core assembly.
//!
//! [`Sounder`] owns the three pipelines built from one [`SounderConfig`]:
//!
//! ```text
//! driver thread              rx-process thread             save-worker thread
//! RxRingBuffer::write_slots -> RxRingBuffer::process_loop -> SaveWorker::run
//!                              (MeasurementExtractor)        ch_measurement_*.bin
//! TxRingBuffer::read_slots
//! ```
//!
//! The driver side runs on whatever thread calls into the rings (in
//! [`Sounder::run_burst`], the calling thread). The two workers are plain named OS
//! threads started by [`Sounder::spawn_workers`] and stopped through a shared
//! `AtomicBool`.

use crate::config::SounderConfig;
use crate::data::{FeedOutcome, RxRingBuffer, TxRingBuffer};
use crate::error::{AppResult, SounderError};
use crate::measurement::{
    measurement_pipeline, MeasurementExtractor, MeasurementFifo, SaveWorker, WindowGeometry,
};
use crate::source::SampleSource;
use crate::stats::StatsSnapshot;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const RX_THREAD_NAME: &str = "rx-process";
const SAVE_THREAD_NAME: &str = "save-worker";

/// The complete acquisition core.
#[derive(Debug)]
pub struct Sounder {
    config: SounderConfig,
    rx: Arc<RxRingBuffer>,
    fifo: Arc<MeasurementFifo>,
    tx: TxRingBuffer,
    /// Both worker halves while no workers are running
    idle: Option<(MeasurementExtractor, SaveWorker)>,
}

/// Handles of the running worker threads.
#[derive(Debug)]
pub struct Workers {
    stop: Arc<AtomicBool>,
    rx: Arc<RxRingBuffer>,
    fifo: Arc<MeasurementFifo>,
    rx_handle: JoinHandle<MeasurementExtractor>,
    save_handle: JoinHandle<SaveWorker>,
}

/// What one [`Sounder::run_burst`] did.
#[derive(Debug, Clone, Serialize)]
pub struct BurstSummary {
    /// Wall-clock duration of the driver loop
    pub elapsed_secs: f64,
    /// Rx deliveries made by the source
    pub deliveries: u64,
    /// Samples per channel received
    pub rx_samples: u64,
    /// Samples per channel taken from the tx ring
    pub tx_samples: u64,
    /// Rx buffers handed to the rx worker
    pub rx_handoffs: u64,
    /// Rx buffers overwritten because the rx worker was busy
    pub rx_dropped: u64,
    /// Measurement files written during the burst
    pub files_written: u64,
    /// Counters of every pipeline at the end of the burst
    pub stats: Vec<StatsSnapshot>,
}

impl Sounder {
    /// Validate `config`, allocate every buffer and write the transmit reference file.
    pub fn new(config: SounderConfig) -> AppResult<Self> {
        config.validate()?;

        let save_path = config.storage.save_path.clone();
        fs::create_dir_all(&save_path).map_err(|source| SounderError::Persist {
            path: save_path.clone(),
            source,
        })?;

        let rx = Arc::new(RxRingBuffer::from_config(&config)?);
        let geometry = WindowGeometry::from_config(&config)?;
        let (extractor, saver) = measurement_pipeline(
            config.radio.channels,
            config.radio.bytes_per_sample,
            geometry,
            &save_path,
            config.diagnostics.stats_enabled,
        );
        let fifo = Arc::clone(extractor.fifo());

        let tx = TxRingBuffer::from_config(&config)?;
        tx.save_reference(&save_path)?;

        info!(
            name = %config.application.name,
            save_path = %save_path.display(),
            "Sounder initialized"
        );

        Ok(Self {
            config,
            rx,
            fifo,
            tx,
            idle: Some((extractor, saver)),
        })
    }

    /// Start the rx-process and save-worker threads.
    ///
    /// Both run until `stop` is set. Fails if workers are already running.
    pub fn spawn_workers(&mut self, stop: Arc<AtomicBool>) -> AppResult<Workers> {
        let (mut extractor, mut saver) = self.idle.take().ok_or_else(|| {
            SounderError::Configuration("workers are already running".into())
        })?;

        let rx = Arc::clone(&self.rx);
        let rx_stop = Arc::clone(&stop);
        let rx_handle = thread::Builder::new()
            .name(RX_THREAD_NAME.into())
            .spawn(move || {
                rx.process_loop(&mut extractor, &rx_stop);
                extractor
            })?;

        let save_stop = Arc::clone(&stop);
        let save_handle = match thread::Builder::new()
            .name(SAVE_THREAD_NAME.into())
            .spawn(move || {
                saver.run(&save_stop);
                saver
            }) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Save worker failed to start, stopping rx worker");
                stop.store(true, Ordering::Relaxed);
                self.rx.buffers().wake_all();
                let _ = rx_handle.join();
                return Err(e.into());
            }
        };

        Ok(Workers {
            stop,
            rx: Arc::clone(&self.rx),
            fifo: Arc::clone(&self.fifo),
            rx_handle,
            save_handle,
        })
    }

    /// Stop and join `workers`, making the pipeline available for the next run.
    pub fn join_workers(&mut self, workers: Workers) -> AppResult<()> {
        let (extractor, saver) = workers.join()?;
        self.idle = Some((extractor, saver));
        Ok(())
    }

    /// Drive `source` from the calling thread for `duration`, or until `stop` is set.
    ///
    /// Zeroes the counters, starts the workers, alternates one rx delivery with one tx
    /// request, then stops the workers (setting `stop`) and reports the statistics of
    /// this burst.
    pub fn run_burst(
        &mut self,
        source: &mut dyn SampleSource,
        duration: Duration,
        stop: Arc<AtomicBool>,
    ) -> AppResult<BurstSummary> {
        let files_before = self.files_written();
        self.reset_stats();
        let workers = self.spawn_workers(Arc::clone(&stop))?;
        info!(duration_secs = duration.as_secs_f64(), "Burst started");

        let started = Instant::now();
        let driven = self.drive(source, duration, &stop);
        let elapsed_secs = started.elapsed().as_secs_f64();
        let joined = self.join_workers(workers);

        let mut summary = driven?;
        joined?;
        summary.elapsed_secs = elapsed_secs;
        summary.files_written = self.files_written() - files_before;
        summary.stats = self.stats_snapshots();

        info!(
            elapsed_secs,
            deliveries = summary.deliveries,
            files_written = summary.files_written,
            "Burst finished"
        );
        self.log_stats();
        Ok(summary)
    }

    fn drive(
        &mut self,
        source: &mut dyn SampleSource,
        duration: Duration,
        stop: &AtomicBool,
    ) -> AppResult<BurstSummary> {
        let mut summary = BurstSummary {
            elapsed_secs: 0.0,
            deliveries: 0,
            rx_samples: 0,
            tx_samples: 0,
            rx_handoffs: 0,
            rx_dropped: 0,
            files_written: 0,
            stats: Vec::new(),
        };

        let started = Instant::now();
        let mut transmitted = 0;
        while !stop.load(Ordering::Relaxed) && started.elapsed() < duration {
            let mut slots = self.rx.write_slots();
            let received = source.receive(&mut slots)?;
            match slots.commit(received) {
                FeedOutcome::Buffered => {}
                FeedOutcome::HandedOff(_) => summary.rx_handoffs += 1,
                FeedOutcome::Dropped => summary.rx_dropped += 1,
            }
            summary.deliveries += 1;
            summary.rx_samples += received as u64;

            let tx_slots = self.tx.read_slots(transmitted);
            transmitted = source.transmit(&tx_slots)?;
            summary.tx_samples += transmitted as u64;
        }
        Ok(summary)
    }

    fn files_written(&self) -> u64 {
        self.idle
            .as_ref()
            .map(|(_, saver)| saver.sequence())
            .unwrap_or_default()
    }

    /// Counters of the rx ring, the measurement fifo and the tx ring.
    pub fn stats_snapshots(&self) -> Vec<StatsSnapshot> {
        vec![
            self.rx.stats().snapshot(),
            self.fifo.stats().snapshot(),
            self.tx.stats().snapshot(),
        ]
    }

    /// Zero every pipeline's counters and restart their clocks.
    pub fn reset_stats(&self) {
        self.rx.stats().reset();
        self.fifo.stats().reset();
        self.tx.stats().reset();
    }

    /// Emit every pipeline's counters through `tracing`.
    pub fn log_stats(&self) {
        if !self.rx.stats().is_enabled() {
            return;
        }
        self.rx.stats().log_report();
        self.fifo.stats().log_report();
        self.tx.stats().log_report();
    }

    /// The rx ring, for driving deliveries directly.
    pub fn rx(&self) -> &Arc<RxRingBuffer> {
        &self.rx
    }

    /// The tx ring, for driving transmit requests directly.
    pub fn tx_mut(&mut self) -> &mut TxRingBuffer {
        &mut self.tx
    }

    /// The measurement fifo.
    pub fn fifo(&self) -> &Arc<MeasurementFifo> {
        &self.fifo
    }

    /// Output directory.
    pub fn save_path(&self) -> &Path {
        &self.config.storage.save_path
    }

    /// Configuration this sounder was built from.
    pub fn config(&self) -> &SounderConfig {
        &self.config
    }
}

impl Workers {
    /// Ask both workers to stop after their current buffer.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.rx.buffers().wake_all();
        self.fifo.buffers().wake_all();
    }

    /// Stop both workers and wait for them to exit.
    ///
    /// Nothing is flushed. A save buffer handed off while the workers are stopping is
    /// written only if the save worker has not exited yet; otherwise it stays pending.
    pub fn join(self) -> AppResult<(MeasurementExtractor, SaveWorker)> {
        self.stop();
        let extractor = self
            .rx_handle
            .join()
            .map_err(|_| SounderError::WorkerPanicked(RX_THREAD_NAME.into()))?;
        let saver = self
            .save_handle
            .join()
            .map_err(|_| SounderError::WorkerPanicked(SAVE_THREAD_NAME.into()))?;
        info!("Workers stopped");
        Ok((extractor, saver))
    }
}
