//! Two-slot producer/consumer handoff with a try-acquire-or-drop producer side.
//!
//! A [`DoubleBuffer`] holds two equally sized buffers. At any instant exactly one of
//! them is *writable* (owned by the real-time producer) and at most one is *pending*
//! (handed to the worker and not yet released). The two are never the same slot.
//!
//! # Protocol
//!
//! Producer, when its buffer is full, calls [`DoubleBuffer::try_hand_off`]:
//! - If the handoff mutex is free and nothing is pending, the full buffer becomes
//!   pending, the other slot becomes writable, and every waiter is notified.
//! - If the worker still holds the mutex (it is processing the previous buffer) or a
//!   previous handoff has not been picked up yet, the call returns
//!   [`HandoffOutcome::Dropped`] immediately and the producer keeps writing into the
//!   same slot. The producer never waits.
//!
//! Worker, in [`DoubleBuffer::wait_and_consume`]: takes the mutex (blocking is fine
//! here), waits on the condition variable with a bounded timeout until something is
//! pending, re-checking its stop predicate on every wakeup, then processes the
//! pending slot while still holding the mutex and finally clears it.
//!
//! Because the worker holds the handoff mutex for as long as it touches the pending
//! slot, and the producer only swaps roles while holding that same mutex, the
//! producer's lock on its writable slot is never contended.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::trace;

/// Which of the two physical slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// First slot
    Buffer0,
    /// Second slot
    Buffer1,
}

impl BufferRole {
    /// Slot index (0 or 1).
    pub fn index(self) -> usize {
        match self {
            BufferRole::Buffer0 => 0,
            BufferRole::Buffer1 => 1,
        }
    }

    /// The opposite slot.
    pub fn other(self) -> Self {
        match self {
            BufferRole::Buffer0 => BufferRole::Buffer1,
            BufferRole::Buffer1 => BufferRole::Buffer0,
        }
    }

    fn from_index(index: u8) -> Self {
        if index == 0 {
            BufferRole::Buffer0
        } else {
            BufferRole::Buffer1
        }
    }
}

/// Result of a producer-side handoff attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum HandoffOutcome {
    /// The given slot is now pending for the worker; the producer writes the other one.
    HandedOff(BufferRole),
    /// The worker was busy; the producer keeps (and overwrites) its current slot.
    Dropped,
}

/// A slot waiting for the worker, with the number of valid samples in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    /// Slot to consume
    pub role: BufferRole,
    /// Valid samples per channel in that slot
    pub samples: usize,
}

/// Two buffers plus the handoff mutex and condition variable guarding them.
#[derive(Debug)]
pub struct DoubleBuffer<B> {
    slots: [Mutex<B>; 2],
    /// Only changed by the producer, and only while holding `pending`.
    writing: AtomicU8,
    pending: Mutex<Option<Pending>>,
    ready: Condvar,
}

impl<B> DoubleBuffer<B> {
    /// Build from two slots; `Buffer0` starts out writable.
    pub fn new(first: B, second: B) -> Self {
        Self {
            slots: [Mutex::new(first), Mutex::new(second)],
            writing: AtomicU8::new(0),
            pending: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Build both slots with the same constructor.
    pub fn from_fn(mut make: impl FnMut() -> B) -> Self {
        let first = make();
        let second = make();
        Self::new(first, second)
    }

    /// The slot the producer currently writes.
    pub fn writing(&self) -> BufferRole {
        BufferRole::from_index(self.writing.load(Ordering::Acquire))
    }

    /// Lock the writable slot. Producer side only.
    pub fn writable(&self) -> MutexGuard<'_, B> {
        self.slots[self.writing().index()].lock()
    }

    /// Run `f` against the writable slot. Producer side only.
    pub fn with_writable<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        let mut slot = self.writable();
        f(&mut slot)
    }

    /// Try to hand the writable slot, holding `samples` valid samples, to the worker.
    ///
    /// Never blocks. Waiters are notified whatever the outcome.
    pub fn try_hand_off(&self, samples: usize) -> HandoffOutcome {
        let outcome = match self.pending.try_lock() {
            Some(mut pending) => {
                if pending.is_some() {
                    HandoffOutcome::Dropped
                } else {
                    let role = self.writing();
                    *pending = Some(Pending { role, samples });
                    self.writing
                        .store(role.other().index() as u8, Ordering::Release);
                    HandoffOutcome::HandedOff(role)
                }
            }
            None => HandoffOutcome::Dropped,
        };
        self.ready.notify_all();
        trace!(?outcome, samples, "Handoff attempt");
        outcome
    }

    /// Wait for a pending slot and process it. Worker side only.
    ///
    /// `on_wait` runs every time the worker enters the wait state. Returns `None` as
    /// soon as `should_stop` is true after a wakeup with nothing pending; a slot that
    /// is already being processed always finishes first.
    pub fn wait_and_consume<R>(
        &self,
        timeout: Duration,
        should_stop: impl Fn() -> bool,
        mut on_wait: impl FnMut(),
        consume: impl FnOnce(&B, usize) -> R,
    ) -> Option<R> {
        let mut pending = self.pending.lock();

        let ready = loop {
            if let Some(ready) = *pending {
                break ready;
            }
            on_wait();
            let _ = self.ready.wait_for(&mut pending, timeout);
            if should_stop() {
                return None;
            }
        };

        let result = {
            let slot = self.slots[ready.role.index()].lock();
            consume(&slot, ready.samples)
        };
        *pending = None;
        Some(result)
    }

    /// Wake every waiting worker so it re-checks its stop predicate.
    pub fn wake_all(&self) {
        self.ready.notify_all();
    }

    /// Currently pending slot, if any. Blocks while the worker is processing.
    pub fn pending(&self) -> Option<Pending> {
        *self.pending.lock()
    }
}
