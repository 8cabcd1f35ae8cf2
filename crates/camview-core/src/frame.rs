//! Frame storage and the per-slot reader/writer lock.
//!
//! A [`Frame`] is allocated once at full sensor capacity and overwritten in
//! place for the lifetime of the viewer. Accessors expose only the region
//! covered by the geometry the frame was last written with, so stale data
//! beyond the active geometry is never processed or displayed.
//!
//! # Display flag
//!
//! The "needs display upload" flag lives beside the lock in [`FrameSlot`]
//! rather than inside the frame. Writers set it while holding the write
//! lock; the render thread clears it while holding a read lock. Both sides
//! therefore observe it consistently with the pixel data without the render
//! thread ever needing exclusive access.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::colormap::Rgb;
use crate::geometry::{CameraGeometry, FrameCapacity};

/// One image's worth of storage.
pub struct Frame {
    original: Box<[u8]>,
    processed: Box<[Rgb]>,
    row_profile: Box<[u64]>,
    col_profile: Box<[u64]>,
    width: usize,
    height: usize,
    sequence: u64,
}

impl Frame {
    /// Allocate a zeroed frame at full capacity.
    #[must_use]
    pub fn with_capacity(capacity: FrameCapacity) -> Self {
        let pixels = capacity.pixels();
        Self {
            original: vec![0u8; pixels].into_boxed_slice(),
            processed: vec![[0u8; 3]; pixels].into_boxed_slice(),
            row_profile: vec![0u64; capacity.max_height as usize].into_boxed_slice(),
            col_profile: vec![0u64; capacity.max_width as usize].into_boxed_slice(),
            width: 0,
            height: 0,
            sequence: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of samples in the active region.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Publish sequence number of the ingestion that last wrote this frame.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Raw 8-bit samples, row-major, bounded by the frame geometry.
    #[inline]
    #[must_use]
    pub fn original(&self) -> &[u8] {
        &self.original[..self.pixel_count()]
    }

    /// Colormapped pixels, row-major, bounded by the frame geometry.
    #[inline]
    #[must_use]
    pub fn processed(&self) -> &[Rgb] {
        &self.processed[..self.pixel_count()]
    }

    /// Colormapped pixels as packed RGB bytes, ready for upload or export.
    #[inline]
    #[must_use]
    pub fn processed_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.processed())
    }

    /// Per-row intensity sums, one entry per image row.
    #[inline]
    #[must_use]
    pub fn row_profile(&self) -> &[u64] {
        &self.row_profile[..self.height]
    }

    /// Per-column intensity sums, one entry per image column.
    #[inline]
    #[must_use]
    pub fn col_profile(&self) -> &[u64] {
        &self.col_profile[..self.width]
    }

    /// Total number of samples the frame can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.original.len()
    }

    /// Resize the active region to `geometry` and zero the profile
    /// accumulators. Pixel data is left untouched.
    pub(crate) fn begin(&mut self, geometry: CameraGeometry, sequence: u64) {
        self.width = geometry.width as usize;
        self.height = geometry.height as usize;
        self.sequence = sequence;
        self.row_profile.fill(0);
        self.col_profile.fill(0);
    }

    /// Mutable views over the full-capacity buffers for the ingestion loop.
    pub(crate) fn buffers_mut(&mut self) -> FrameBuffersMut<'_> {
        FrameBuffersMut {
            original: &mut self.original,
            processed: &mut self.processed,
            row_profile: &mut self.row_profile,
            col_profile: &mut self.col_profile,
        }
    }

    /// Zero every buffer over the whole capacity.
    pub(crate) fn clear(&mut self) {
        self.original.fill(0);
        self.processed.fill([0, 0, 0]);
        self.row_profile.fill(0);
        self.col_profile.fill(0);
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("capacity", &self.capacity())
            .finish()
    }
}

pub(crate) struct FrameBuffersMut<'a> {
    pub original: &'a mut [u8],
    pub processed: &'a mut [Rgb],
    pub row_profile: &'a mut [u64],
    pub col_profile: &'a mut [u64],
}

/// Shared read access to a slot's frame. Released on drop.
pub type ReadGuard<'a> = RwLockReadGuard<'a, Frame>;

/// Exclusive write access to a slot's frame. Released on drop.
pub type WriteGuard<'a> = RwLockWriteGuard<'a, Frame>;

/// A frame guarded by a reader/writer lock.
///
/// Slots know nothing about which of the pair is current; that belongs to
/// [`DoubleBuffer`](crate::double_buffer::DoubleBuffer).
pub struct FrameSlot {
    frame: RwLock<Frame>,
    needs_upload: AtomicBool,
}

impl FrameSlot {
    /// Allocate a zeroed slot. It starts flagged for upload so the render
    /// thread creates its display resource on the first tick.
    #[must_use]
    pub fn new(capacity: FrameCapacity) -> Self {
        Self {
            frame: RwLock::new(Frame::with_capacity(capacity)),
            needs_upload: AtomicBool::new(true),
        }
    }

    /// Block until no writer holds the slot, then share it with other
    /// readers.
    pub fn acquire_read(&self) -> ReadGuard<'_> {
        self.frame.read()
    }

    /// Read access if no writer currently holds the slot.
    pub fn try_acquire_read(&self) -> Option<ReadGuard<'_>> {
        self.frame.try_read()
    }

    /// Block until the slot is free of readers and writers.
    pub fn acquire_write(&self) -> WriteGuard<'_> {
        self.frame.write()
    }

    /// Flag the slot for display upload. Call while holding the write guard.
    pub fn mark_dirty(&self) {
        self.needs_upload.store(true, Ordering::Release);
    }

    /// Whether the slot's pixels changed since the last upload.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.needs_upload.load(Ordering::Acquire)
    }

    /// Clear the upload flag, returning whether it was set. Call while
    /// holding a read guard so no writer can interleave.
    pub fn take_dirty(&self) -> bool {
        self.needs_upload.swap(false, Ordering::AcqRel)
    }
}

impl std::fmt::Debug for FrameSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSlot")
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_zeroed_and_empty() {
        let frame = Frame::with_capacity(FrameCapacity::new(8, 4));
        assert_eq!(frame.capacity(), 32);
        assert!(frame.original().is_empty());
        assert!(frame.row_profile().is_empty());
        assert_eq!(frame.sequence(), 0);
    }

    #[test]
    fn begin_bounds_views_by_geometry() {
        let mut frame = Frame::with_capacity(FrameCapacity::new(8, 4));
        frame.begin(CameraGeometry::new(3, 2), 7);
        assert_eq!(frame.original().len(), 6);
        assert_eq!(frame.processed_bytes().len(), 18);
        assert_eq!(frame.row_profile().len(), 2);
        assert_eq!(frame.col_profile().len(), 3);
        assert_eq!(frame.sequence(), 7);
    }

    #[test]
    fn slot_starts_dirty_and_take_clears() {
        let slot = FrameSlot::new(FrameCapacity::new(2, 2));
        assert!(slot.take_dirty());
        assert!(!slot.take_dirty());
        slot.mark_dirty();
        assert!(slot.is_dirty());
    }

    #[test]
    fn readers_share_a_slot() {
        let slot = FrameSlot::new(FrameCapacity::new(2, 2));
        let a = slot.acquire_read();
        let b = slot.acquire_read();
        assert_eq!(a.capacity(), b.capacity());
    }
}
