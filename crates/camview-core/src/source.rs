//! Seams between the viewer and whatever produces frames.
//!
//! A device driver implements [`FrameSource`] and [`CaptureControl`]; the
//! viewer context implements [`FrameSink`]. Drivers call the sink from their
//! own threads, so every sink method must be callable concurrently with the
//! render thread.

use std::sync::Arc;

use crate::error::AppResult;

/// Link state reported by a frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Receives frames and state changes from a source.
pub trait FrameSink: Send + Sync {
    /// A raw 8-bit frame arrived. Every byte of `samples` is a delivered
    /// sample.
    fn on_frame(&self, samples: &[u8]);

    fn on_connection(&self, state: ConnectionState);

    /// The source started or stopped capturing on its own.
    fn on_capture_state(&self, capturing: bool);
}

/// Turn acquisition on or off at the source.
pub trait CaptureControl: Send + Sync {
    fn set_capture(&self, enabled: bool) -> AppResult<()>;
}

/// A producer of frames.
pub trait FrameSource: CaptureControl {
    /// Start delivering to `sink`. Returns once the producer is running.
    fn start(&self, sink: Arc<dyn FrameSink>) -> AppResult<()>;

    /// Stop delivering and join the producer.
    fn stop(&self) -> AppResult<()>;
}
