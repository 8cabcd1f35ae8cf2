//! `camview-core`
//!
//! Frame ingestion and presentation pipeline for a live camera viewer.
//!
//! A device driver pushes raw 8-bit frames from its own thread. Each frame is
//! colormapped, profiled and written into the free half of a double buffer,
//! then published. A single render thread reads whichever half is current,
//! uploads it to the display when it changed and draws it at a bounded rate.
//! Neither side ever sees the other's half-written data.
//!
//! ## Key Types
//!
//! - [`ViewerContext`]: shared state for one viewer, and the [`FrameSink`]
//!   a driver delivers into
//! - [`DoubleBuffer`]: the two frame slots and the current-slot index
//! - [`RenderLoop`]: draws the current slot through a [`DisplaySurface`]
//! - [`ViewerConfig`]: layered configuration (defaults, TOML, environment)
//!
//! ## Example
//!
//! ```rust,no_run
//! use camview_core::{FrameSink, ViewerConfig, ViewerContext};
//!
//! # fn main() -> camview_core::AppResult<()> {
//! let config = ViewerConfig::load(None)?;
//! let ctx = ViewerContext::new("camera-1", &config)?;
//! let frame = vec![0u8; config.camera.initial.pixels()];
//! ctx.on_frame(&frame);
//! # Ok(())
//! # }
//! ```

pub mod colormap;
pub mod config;
pub mod context;
pub mod double_buffer;
pub mod error;
pub mod export;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod layout;
pub mod limits;
pub mod rate;
pub mod render;
pub mod source;
pub mod throttle;

pub use colormap::{ActiveColormap, Colormap, Rgb};
pub use config::ViewerConfig;
pub use context::ViewerContext;
pub use double_buffer::DoubleBuffer;
pub use error::{AppResult, ViewerError};
pub use export::{PngExporter, SnapshotExporter};
pub use frame::{Frame, FrameSlot};
pub use geometry::{CameraGeometry, FrameCapacity, GainControl, ParameterStore, TriggerSource};
pub use ingest::{blackout, ingest, IngestReport};
pub use layout::{ImageRect, Viewport, ViewportLayout};
pub use rate::FrameRateMonitor;
pub use render::{DisplaySurface, ProfileAxis, RenderLoop, TickReport};
pub use source::{CaptureControl, ConnectionState, FrameSink, FrameSource};
pub use throttle::{FrameThrottle, Pace};
