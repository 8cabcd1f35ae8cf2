//! Frame ingestion: colormap, profile and publish one delivered frame.
//!
//! Runs on whatever thread delivers frames. Each call is one atomic unit
//! from the readers' point of view: the free slot is written entirely under
//! its write lock and only becomes current once that lock is released.
//!
//! Deliveries shorter than the geometry are truncated, not rejected. The
//! unfilled tail keeps whatever that slot held two frames ago. Deliveries
//! longer than the geometry have their excess ignored.

use tracing::warn;

use crate::colormap::Colormap;
use crate::double_buffer::DoubleBuffer;
use crate::geometry::CameraGeometry;
use crate::error::AppResult;

/// Outcome of a single ingestion or blackout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Slot that was written and published.
    pub slot: usize,
    /// Sequence number stamped on the frame.
    pub sequence: u64,
    /// Samples copied into the frame.
    pub valid_samples: usize,
    /// Whether the delivery was shorter than the geometry.
    pub truncated: bool,
}

/// Write `samples` into the free slot and publish it.
///
/// `geometry` is the snapshot taken for this frame. It must fit the buffer
/// capacity; a geometry that does not is rejected before any slot is
/// touched.
pub fn ingest(
    buffers: &DoubleBuffer,
    geometry: CameraGeometry,
    colormap: Colormap,
    samples: &[u8],
) -> AppResult<IngestReport> {
    buffers.capacity().check(&geometry)?;

    let expected = geometry.pixels();
    let valid = samples.len().min(expected);
    let width = geometry.width as usize;

    let slot_index = buffers.begin_write();
    let slot = buffers.slot(slot_index);
    let sequence = buffers.published_count() + 1;

    {
        let mut frame = slot.acquire_write();
        frame.begin(geometry, sequence);
        let out = frame.buffers_mut();

        for (row, chunk) in samples[..valid].chunks(width).enumerate() {
            let start = row * width;
            let end = start + chunk.len();
            let mut row_sum = 0u64;

            out.original[start..end].copy_from_slice(chunk);
            for ((&v, px), col_sum) in chunk
                .iter()
                .zip(out.processed[start..end].iter_mut())
                .zip(out.col_profile.iter_mut())
            {
                *px = colormap.apply(v);
                *col_sum += u64::from(v);
                row_sum += u64::from(v);
            }
            out.row_profile[row] = row_sum;
        }

        slot.mark_dirty();
    }

    buffers.publish(slot_index);

    let truncated = valid < expected;
    if truncated {
        warn!(
            delivered = samples.len(),
            expected,
            width = geometry.width,
            height = geometry.height,
            "Short frame delivery truncated"
        );
    }

    Ok(IngestReport {
        slot: slot_index,
        sequence,
        valid_samples: valid,
        truncated,
    })
}

/// Zero the free slot and publish it.
///
/// Same sequence as [`ingest`] with an all-zero delivery, except that the
/// whole buffer capacity is cleared rather than only the active region.
/// Calling it twice leaves both slots black.
pub fn blackout(buffers: &DoubleBuffer, geometry: CameraGeometry) -> AppResult<IngestReport> {
    buffers.capacity().check(&geometry)?;

    let slot_index = buffers.begin_write();
    let slot = buffers.slot(slot_index);
    let sequence = buffers.published_count() + 1;

    {
        let mut frame = slot.acquire_write();
        frame.begin(geometry, sequence);
        frame.clear();
        slot.mark_dirty();
    }

    buffers.publish(slot_index);

    Ok(IngestReport {
        slot: slot_index,
        sequence,
        valid_samples: geometry.pixels(),
        truncated: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use crate::geometry::FrameCapacity;

    const SAMPLES: [u8; 12] = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120];

    fn buffers() -> DoubleBuffer {
        DoubleBuffer::new(FrameCapacity::new(8, 6))
    }

    #[test]
    fn profiles_sum_rows_and_columns() {
        let buffers = buffers();
        let report = ingest(
            &buffers,
            CameraGeometry::new(4, 3),
            Colormap::Grayscale,
            &SAMPLES,
        )
        .unwrap();
        assert_eq!(report.valid_samples, 12);
        assert!(!report.truncated);

        let frame = buffers.slot(buffers.current()).acquire_read();
        assert_eq!(frame.row_profile(), &[100, 260, 420]);
        assert_eq!(frame.col_profile(), &[150, 180, 210, 240]);
        assert_eq!(frame.original(), &SAMPLES);
        for (px, &v) in frame.processed().iter().zip(SAMPLES.iter()) {
            assert_eq!(*px, [v, v, v]);
        }
    }

    #[test]
    fn publishes_the_slot_it_wrote() {
        let buffers = buffers();
        let before = buffers.current();
        let report = ingest(&buffers, CameraGeometry::new(4, 3), Colormap::HotCold, &SAMPLES)
            .unwrap();
        assert_eq!(report.slot, 1 - before);
        assert_eq!(buffers.current(), report.slot);
        assert_eq!(report.sequence, buffers.published_count());
        assert!(buffers.slot(report.slot).is_dirty());
    }

    #[test]
    fn excess_samples_are_ignored() {
        let buffers = buffers();
        let mut long = SAMPLES.to_vec();
        long.extend_from_slice(&[255; 20]);
        ingest(&buffers, CameraGeometry::new(4, 3), Colormap::Grayscale, &long).unwrap();

        let frame = buffers.slot(buffers.current()).acquire_read();
        assert_eq!(frame.original(), &SAMPLES);
        assert_eq!(frame.row_profile(), &[100, 260, 420]);
    }

    #[test]
    fn profiles_do_not_leak_across_geometry_changes() {
        let buffers = buffers();
        let bright = [200u8; 48];
        ingest(&buffers, CameraGeometry::new(8, 6), Colormap::Grayscale, &bright).unwrap();
        ingest(&buffers, CameraGeometry::new(8, 6), Colormap::Grayscale, &bright).unwrap();

        ingest(&buffers, CameraGeometry::new(4, 3), Colormap::Grayscale, &SAMPLES).unwrap();
        let frame = buffers.slot(buffers.current()).acquire_read();
        assert_eq!(frame.col_profile(), &[150, 180, 210, 240]);
        assert_eq!(frame.row_profile(), &[100, 260, 420]);
    }

    #[test]
    fn rejects_geometry_over_capacity_without_publishing() {
        let buffers = buffers();
        let result = ingest(&buffers, CameraGeometry::new(9, 6), Colormap::Grayscale, &[0; 54]);
        assert!(matches!(result, Err(ViewerError::GeometryTooLarge { .. })));
        assert_eq!(buffers.published_count(), 0);
    }

    #[test]
    fn blackout_zeroes_whole_slot() {
        let buffers = buffers();
        let bright = [255u8; 48];
        ingest(&buffers, CameraGeometry::new(8, 6), Colormap::HotCold, &bright).unwrap();
        ingest(&buffers, CameraGeometry::new(8, 6), Colormap::HotCold, &bright).unwrap();

        let report = blackout(&buffers, CameraGeometry::new(4, 3)).unwrap();
        let frame = buffers.slot(report.slot).acquire_read();
        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert!(frame.original().iter().all(|&v| v == 0));
        assert!(frame.processed().iter().all(|px| *px == [0, 0, 0]));
        assert!(frame.row_profile().iter().all(|&s| s == 0));
        assert!(frame.col_profile().iter().all(|&s| s == 0));
    }
}
