//! Simulated camera for camview.
//!
//! [`MockCamera`] stands in for a real device driver: it runs its own
//! producer thread, reads the active geometry from the shared
//! [`ParameterStore`](camview_core::ParameterStore), and pushes 8-bit test
//! patterns into any [`FrameSink`](camview_core::FrameSink) at a fixed rate.
//! It honours capture enable/disable and can simulate losing the link.

mod mock_camera;
mod pattern;

pub use mock_camera::{MockCamera, MockCameraBuilder};
pub use pattern::fill_test_pattern;
