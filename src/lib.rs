//! # Channel Sounder Acquisition Core
//!
//! This crate is the real-time data path of a multi-channel radio channel sounder. A
//! radio driver delivers bursts of interleaved-per-channel samples; the crate buffers
//! them, cuts the periodic measurement windows out of the stream and persists them as
//! raw binary files, while serving a precomputed repeating waveform to the transmit
//! side. The driver thread never blocks: when a worker falls behind, data is dropped
//! and counted instead.
//!
//! ## Crate Structure
//!
//! - **`config`**: Figment-based loading and validation of `SounderConfig`.
//! - **`data`**: Buffering. `RxRingBuffer` (double-buffered receive staging),
//!   `TxRingBuffer` (precomputed transmit waveform), and the `DoubleBuffer` handoff
//!   primitive both pipelines are built on.
//! - **`error`**: The `SounderError` enum for centralized error handling.
//! - **`logging`**: `tracing-subscriber` initialization.
//! - **`measurement`**: The window-extraction state machine and the save worker.
//! - **`sounder`**: `Sounder`, which assembles all pipelines and runs their worker
//!   threads.
//! - **`source`**: The `SampleSource` seam for the radio driver, with a synthetic
//!   implementation.
//! - **`stats`**: Per-pipeline counters and reports.

pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod measurement;
pub mod sounder;
pub mod source;
pub mod stats;

pub use config::SounderConfig;
pub use error::{AppResult, SounderError};
pub use sounder::{BurstSummary, Sounder, Workers};
