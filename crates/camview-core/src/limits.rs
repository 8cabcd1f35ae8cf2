//! Shared constants for buffer capacity and presentation timing.
//!
//! Centralised so the config defaults, the parameter store and the render
//! loop agree on the same numbers.

use std::time::Duration;

// =============================================================================
// Frame Buffer Capacity
// =============================================================================

/// Default maximum sensor width in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 1296;

/// Default maximum sensor height in pixels.
pub const DEFAULT_MAX_HEIGHT: u32 = 966;

// =============================================================================
// Presentation
// =============================================================================

/// Default render loop frequency in Hz.
pub const DEFAULT_TARGET_FPS: f32 = 20.0;

/// Fraction of the target period the throttle accepts before it stops
/// sleeping. Slightly under 1.0 so the loop does not overshoot by a full
/// sleep increment.
pub const THROTTLE_TOLERANCE: f32 = 0.98;

/// Sleep granularity of the throttle.
pub const THROTTLE_STEP: Duration = Duration::from_millis(1);

/// Window after which the displayed frame rate resets to zero if no new
/// frame arrived.
pub const DEFAULT_STALL_WINDOW: Duration = Duration::from_secs(2);

// =============================================================================
// Window Layout
// =============================================================================

/// Default window width.
pub const DEFAULT_WINDOW_WIDTH: u32 = 800;

/// Default window height.
pub const DEFAULT_WINDOW_HEIGHT: u32 = 600;

/// Width reserved on the left edge for the settings bar.
pub const DEFAULT_LEFT_BAR_WIDTH: u32 = 200;

/// Fraction of the drawing area a full-scale profile curve spans.
pub const PROFILE_SPAN: f32 = 0.2;
