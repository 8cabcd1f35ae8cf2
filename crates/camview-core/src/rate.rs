//! Ingress frame rate statistic with a stall detector.
//!
//! The rate is the reciprocal of the interval between the two most recent
//! frame arrivals. The render loop calls [`FrameRateMonitor::roll_window`]
//! once per throttle window; if no frame arrived during that window the
//! statistic drops to zero. The image itself is left alone; only an explicit
//! disable or disconnect blacks it out.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
pub struct FrameRateMonitor {
    last_arrival: Mutex<Option<Instant>>,
    fps_bits: AtomicU32,
    got_frame: AtomicBool,
}

impl FrameRateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame arriving at `now`.
    pub fn record_arrival(&self, now: Instant) {
        let previous = self.last_arrival.lock().replace(now);
        if let Some(previous) = previous {
            let interval = now.saturating_duration_since(previous).as_secs_f32();
            if interval > 0.0 {
                self.store_fps(1.0 / interval);
            }
        }
        self.got_frame.store(true, Ordering::Release);
    }

    /// Most recent rate in frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        f32::from_bits(self.fps_bits.load(Ordering::Acquire))
    }

    /// Close the current stall window.
    ///
    /// Returns `true` if the rate was reset because nothing arrived.
    pub fn roll_window(&self) -> bool {
        if self.got_frame.swap(false, Ordering::AcqRel) {
            false
        } else {
            if self.fps() != 0.0 {
                debug!("No frames during stall window, resetting frame rate");
            }
            self.store_fps(0.0);
            true
        }
    }

    /// Zero the statistic and forget the last arrival.
    pub fn reset(&self) {
        *self.last_arrival.lock() = None;
        self.got_frame.store(false, Ordering::Release);
        self.store_fps(0.0);
    }

    fn store_fps(&self, fps: f32) {
        self.fps_bits.store(fps.to_bits(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rate_is_reciprocal_of_last_interval() {
        let monitor = FrameRateMonitor::new();
        let t0 = Instant::now();
        monitor.record_arrival(t0);
        assert_eq!(monitor.fps(), 0.0);

        monitor.record_arrival(t0 + Duration::from_millis(50));
        assert!((monitor.fps() - 20.0).abs() < 0.01);

        monitor.record_arrival(t0 + Duration::from_millis(60));
        assert!((monitor.fps() - 100.0).abs() < 0.1);
    }

    #[test]
    fn stall_window_resets_rate_only_when_idle() {
        let monitor = FrameRateMonitor::new();
        let t0 = Instant::now();
        monitor.record_arrival(t0);
        monitor.record_arrival(t0 + Duration::from_millis(100));

        assert!(!monitor.roll_window());
        assert!(monitor.fps() > 0.0);

        assert!(monitor.roll_window());
        assert_eq!(monitor.fps(), 0.0);
    }

    #[test]
    fn reset_forgets_last_arrival() {
        let monitor = FrameRateMonitor::new();
        let t0 = Instant::now();
        monitor.record_arrival(t0);
        monitor.record_arrival(t0 + Duration::from_millis(10));
        monitor.reset();
        assert_eq!(monitor.fps(), 0.0);

        // First arrival after a reset has no interval to measure.
        monitor.record_arrival(t0 + Duration::from_secs(5));
        assert_eq!(monitor.fps(), 0.0);
    }
}
