//! Self-correcting render throttle.
//!
//! Instead of sleeping a fixed period after every frame, the throttle counts
//! frames since a reference instant and sleeps in small steps only while the
//! average frame time is still under the target period. A slow render is
//! compensated by shorter waits on the following ticks, which smooths out
//! jitter from variable-cost draws.

use std::time::{Duration, Instant};
use tracing::warn;

use crate::limits::{DEFAULT_STALL_WINDOW, DEFAULT_TARGET_FPS, THROTTLE_STEP, THROTTLE_TOLERANCE};

/// Result of one [`FrameThrottle::pace`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pace {
    /// Average frames per second over the current window.
    pub achieved_fps: f32,
    /// The averaging window was restarted on this call.
    pub window_rolled: bool,
}

#[derive(Debug, Clone)]
pub struct FrameThrottle {
    target_fps: f32,
    window: Duration,
    reference: Instant,
    frames: u32,
}

/// Rates without a finite positive period are replaced by the default.
fn sanitize_target(target_fps: f32) -> f32 {
    if target_fps.is_finite() && target_fps > 0.0 {
        target_fps
    } else {
        warn!(target_fps, fallback = DEFAULT_TARGET_FPS, "Invalid render target rate");
        DEFAULT_TARGET_FPS
    }
}

impl FrameThrottle {
    /// Targets that are zero, negative or not finite fall back to
    /// [`DEFAULT_TARGET_FPS`].
    pub fn new(target_fps: f32, window: Duration) -> Self {
        Self {
            target_fps: sanitize_target(target_fps),
            window,
            reference: Instant::now(),
            frames: 0,
        }
    }

    #[must_use]
    pub fn target_fps(&self) -> f32 {
        self.target_fps
    }

    pub fn set_target_fps(&mut self, target_fps: f32) {
        self.target_fps = sanitize_target(target_fps);
        self.restart();
    }

    /// Restart the averaging window from now.
    pub fn restart(&mut self) {
        self.reference = Instant::now();
        self.frames = 0;
    }

    /// Account for one rendered frame, sleeping if the loop is running ahead
    /// of the target rate.
    pub fn pace(&mut self) -> Pace {
        self.frames += 1;
        let frames = self.frames as f32;
        let period = 1.0 / self.target_fps;

        let mut interval = self.reference.elapsed().as_secs_f32();
        if interval / frames < period {
            let floor = THROTTLE_TOLERANCE * period;
            loop {
                interval = self.reference.elapsed().as_secs_f32();
                if interval / frames >= floor {
                    break;
                }
                std::thread::sleep(THROTTLE_STEP);
            }
        }

        let achieved_fps = if interval > 0.0 { frames / interval } else { 0.0 };
        let window_rolled = interval >= self.window.as_secs_f32();
        if window_rolled {
            self.restart();
        }

        Pace {
            achieved_fps,
            window_rolled,
        }
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_FPS, DEFAULT_STALL_WINDOW)
    }
}
