//! Sample buffering: the rx staging ring, the tx waveform ring and the handoff
//! primitive they are built on.
pub mod channel_buffers;
pub mod double_buffer;
pub mod rx_ring_buffer;
pub mod tx_ring_buffer;
pub mod waveform;

pub use channel_buffers::ChannelBuffers;
pub use double_buffer::{BufferRole, DoubleBuffer, HandoffOutcome, Pending};
pub use rx_ring_buffer::{FeedOutcome, RxRingBuffer, WriteSlots};
pub use tx_ring_buffer::{TxRingBuffer, TxSlots};
pub use waveform::{SampleFormat, Waveform};

use std::time::Duration;

/// How long a worker waits on its condition variable before re-checking the stop flag.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);
