//! Concurrency tests for the double buffer.
//!
//! A single writer publishes uniform frames (every sample equal to the
//! frame's sequence number modulo 256) while several readers validate
//! whatever frame is current. A torn frame would show up as a mix of two
//! sample values, or as profiles that disagree with the samples.

use camview_core::{ingest, CameraGeometry, Colormap, DoubleBuffer, Frame, FrameCapacity};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const WIDTH: u32 = 16;
const HEIGHT: u32 = 12;
const PUBLISHES: u64 = 10_000;
const READERS: usize = 4;

/// Panics if `frame` is not internally consistent.
fn check_uniform(frame: &Frame) {
    if frame.pixel_count() == 0 {
        return;
    }
    let value = frame.original()[0];
    assert!(
        frame.original().iter().all(|&v| v == value),
        "torn raw data in frame {}",
        frame.sequence()
    );
    assert!(frame.processed().iter().all(|px| *px == [value; 3]));

    let row_sum = u64::from(value) * WIDTH as u64;
    let col_sum = u64::from(value) * HEIGHT as u64;
    assert!(frame.row_profile().iter().all(|&s| s == row_sum));
    assert!(frame.col_profile().iter().all(|&s| s == col_sum));
    assert_eq!(frame.sequence() % 256, u64::from(value));
}

#[test]
fn readers_never_observe_torn_frames() {
    let buffers = DoubleBuffer::new(FrameCapacity::new(WIDTH, HEIGHT));
    let geometry = CameraGeometry::new(WIDTH, HEIGHT);
    let done = AtomicBool::new(false);
    let reads = AtomicU64::new(0);

    std::thread::scope(|s| {
        for _ in 0..READERS {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let published_before = buffers.published_count();
                    let (_, slot) = buffers.current_slot();
                    let frame = slot.acquire_read();
                    check_uniform(&frame);
                    // Never more than one generation behind.
                    assert!(
                        frame.sequence() + 1 >= published_before,
                        "reader saw {} after {} publishes",
                        frame.sequence(),
                        published_before
                    );
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            });
        }

        s.spawn(|| {
            let mut samples = vec![0u8; geometry.pixels()];
            for n in 1..=PUBLISHES {
                samples.fill((n % 256) as u8);
                let report = ingest(&buffers, geometry, Colormap::Grayscale, &samples).unwrap();
                assert_eq!(report.sequence, n);
            }
            done.store(true, Ordering::Release);
        });
    });

    assert_eq!(buffers.published_count(), PUBLISHES);
    assert!(reads.load(Ordering::Relaxed) > 0);

    let (_, slot) = buffers.current_slot();
    let frame = slot.acquire_read();
    assert_eq!(frame.sequence(), PUBLISHES);
    check_uniform(&frame);
}

#[test]
fn reader_on_current_slot_does_not_block_ingestion() {
    let buffers = DoubleBuffer::new(FrameCapacity::new(WIDTH, HEIGHT));
    let geometry = CameraGeometry::new(WIDTH, HEIGHT);
    let samples = vec![7u8; geometry.pixels()];

    let (held_index, slot) = buffers.current_slot();
    let guard = slot.acquire_read();

    // Same thread: would deadlock if ingestion wanted the held slot.
    let report = ingest(&buffers, geometry, Colormap::HotCold, &samples).unwrap();
    assert_ne!(report.slot, held_index);
    assert_eq!(buffers.current(), report.slot);

    drop(guard);
}
