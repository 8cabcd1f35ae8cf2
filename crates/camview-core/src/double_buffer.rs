//! Two frame slots and the index naming which one readers should use.
//!
//! # Protocol
//!
//! ```text
//! writer:  idx = begin_write()          (short mutex)
//!          slot(idx).acquire_write()    (slot lock, long)
//!          ... fill frame ...
//!          drop(guard)
//!          publish(idx)                 (short mutex)
//!
//! reader:  idx = current()              (short mutex)
//!          slot(idx).acquire_read()     (slot lock)
//! ```
//!
//! The index mutex is never held while a slot lock is held, so the two lock
//! levels cannot deadlock. A reader that loses a race with `publish` simply
//! reads the previous frame, which is still complete.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::frame::FrameSlot;
use crate::geometry::FrameCapacity;

/// Double-buffer coordinator.
pub struct DoubleBuffer {
    capacity: FrameCapacity,
    slots: [FrameSlot; 2],
    current: Mutex<usize>,
    published: AtomicU64,
}

impl DoubleBuffer {
    /// Allocate both slots at `capacity`. Slot 0 starts current.
    #[must_use]
    pub fn new(capacity: FrameCapacity) -> Self {
        Self {
            capacity,
            slots: [FrameSlot::new(capacity), FrameSlot::new(capacity)],
            current: Mutex::new(0),
            published: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> FrameCapacity {
        self.capacity
    }

    /// Index of the slot readers should use.
    #[must_use]
    pub fn current(&self) -> usize {
        *self.current.lock()
    }

    /// Index of the slot the next writer should fill.
    ///
    /// The caller still has to take that slot's write lock.
    #[must_use]
    pub fn begin_write(&self) -> usize {
        1 - self.current()
    }

    /// Make `written` the current slot.
    ///
    /// Call only after the write guard on `written` has been dropped.
    pub fn publish(&self, written: usize) {
        debug_assert!(written < 2, "slot index out of range: {}", written);
        *self.current.lock() = written;
        let count = self.published.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(slot = written, count, "Frame published");
    }

    /// Number of publishes so far.
    ///
    /// Each ingestion stamps its frame with the value this will reach once it
    /// publishes, so `published_count() - frame.sequence()` is how many
    /// generations a reader is behind.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index]
    }

    /// The current slot together with its index.
    #[must_use]
    pub fn current_slot(&self) -> (usize, &FrameSlot) {
        let index = self.current();
        (index, &self.slots[index])
    }
}

impl std::fmt::Debug for DoubleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoubleBuffer")
            .field("current", &self.current())
            .field("published", &self.published_count())
            .finish_non_exhaustive()
    }
}
