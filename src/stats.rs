//! Per-pipeline counters.
//!
//! Each pipeline owns one [`Stats`] block. The producer thread and the worker thread
//! write disjoint counters, so relaxed atomics are enough; reads are best-effort and
//! only used for diagnostics. When collection is disabled every `record_*` call is a
//! branch on a plain `bool` and nothing else.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for one pipeline (rx ring, measurement fifo or tx ring).
#[derive(Debug)]
pub struct Stats {
    label: &'static str,
    enabled: bool,
    started: Mutex<(Instant, DateTime<Utc>)>,
    /// Samples per channel seen by the producer.
    samples_total: AtomicU64,
    /// Buffer-full events on the producer side.
    buffers_full: AtomicU64,
    /// Times the worker entered its wait state.
    worker_waits: AtomicU64,
    /// Buffers the worker processed.
    worker_executed: AtomicU64,
    /// Buffer-full events where the worker was still busy.
    dropped_busy: AtomicU64,
    /// Save cycles that failed to write their file.
    write_errors: AtomicU64,
}

/// Point-in-time copy of a [`Stats`] block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Pipeline name
    pub label: &'static str,
    /// When the block was last reset
    pub started_at: DateTime<Utc>,
    /// Seconds since the last reset
    pub elapsed_secs: f64,
    /// Samples per channel seen by the producer
    pub samples_total: u64,
    /// Buffer-full events
    pub buffers_full: u64,
    /// Worker wait-state entries
    pub worker_waits: u64,
    /// Buffers processed by the worker
    pub worker_executed: u64,
    /// Handoffs dropped because the worker was busy
    pub dropped_busy: u64,
    /// Failed file writes
    pub write_errors: u64,
}

impl Stats {
    /// Create a block; `enabled = false` turns every `record_*` into a no-op.
    pub fn new(label: &'static str, enabled: bool) -> Self {
        Self {
            label,
            enabled,
            started: Mutex::new((Instant::now(), Utc::now())),
            samples_total: AtomicU64::new(0),
            buffers_full: AtomicU64::new(0),
            worker_waits: AtomicU64::new(0),
            worker_executed: AtomicU64::new(0),
            dropped_busy: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Whether counters are being collected.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Zero every counter and restart the clock.
    pub fn reset(&self) {
        *self.started.lock() = (Instant::now(), Utc::now());
        for counter in [
            &self.samples_total,
            &self.buffers_full,
            &self.worker_waits,
            &self.worker_executed,
            &self.dropped_busy,
            &self.write_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64, n: u64) {
        if self.enabled {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    /// Count `n` samples per channel taken in by the producer.
    #[inline]
    pub fn record_samples(&self, n: usize) {
        self.bump(&self.samples_total, n as u64);
    }

    /// Count one buffer-full event.
    #[inline]
    pub fn record_full(&self) {
        self.bump(&self.buffers_full, 1);
    }

    /// Count one entry into the worker's wait state.
    #[inline]
    pub fn record_wait(&self) {
        self.bump(&self.worker_waits, 1);
    }

    /// Count one buffer processed by the worker.
    #[inline]
    pub fn record_executed(&self) {
        self.bump(&self.worker_executed, 1);
    }

    /// Count one handoff lost to a busy worker.
    #[inline]
    pub fn record_dropped(&self) {
        self.bump(&self.dropped_busy, 1);
    }

    /// Count one save cycle whose file could not be written.
    #[inline]
    pub fn record_write_error(&self) {
        self.bump(&self.write_errors, 1);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        let (started, started_at) = *self.started.lock();
        StatsSnapshot {
            label: self.label,
            started_at,
            elapsed_secs: started.elapsed().as_secs_f64(),
            samples_total: self.samples_total.load(Ordering::Relaxed),
            buffers_full: self.buffers_full.load(Ordering::Relaxed),
            worker_waits: self.worker_waits.load(Ordering::Relaxed),
            worker_executed: self.worker_executed.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }

    /// Emit the current snapshot as one structured `info` event.
    pub fn log_report(&self) {
        let s = self.snapshot();
        info!(
            pipeline = s.label,
            elapsed_secs = s.elapsed_secs,
            rate_msps = s.rate_msps(),
            samples_total = s.samples_total,
            buffers_full = s.buffers_full,
            worker_waits = s.worker_waits,
            worker_executed = s.worker_executed,
            dropped_busy = s.dropped_busy,
            write_errors = s.write_errors,
            "Pipeline statistics"
        );
    }
}

impl StatsSnapshot {
    /// Producer throughput in mega-samples per second per channel.
    pub fn rate_msps(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.samples_total as f64 / self.elapsed_secs / 1e6
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--------------------------")?;
        writeln!(f, "{}:", self.label)?;
        writeln!(f, "Execution time in sec: {:.3}", self.elapsed_secs)?;
        writeln!(f, "Data rate in MS/sec: {:.3}", self.rate_msps())?;
        writeln!(f, "samples_total: {}", self.samples_total)?;
        writeln!(f, "buffers_full: {}", self.buffers_full)?;
        writeln!(f, "worker_waits: {}", self.worker_waits)?;
        writeln!(f, "worker_executed: {}", self.worker_executed)?;
        writeln!(f, "dropped_busy: {}", self.dropped_busy)?;
        writeln!(f, "write_errors: {}", self.write_errors)?;
        write!(f, "--------------------------")
    }
}
