//! The viewer context: everything one viewer window shares across threads.
//!
//! One [`ViewerContext`] exists per process. It is wrapped in an `Arc` and
//! handed to the frame source (as a [`FrameSink`]), the render thread and
//! any snapshot workers.

use chrono::Local;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::colormap::{ActiveColormap, Colormap};
use crate::config::ViewerConfig;
use crate::double_buffer::DoubleBuffer;
use crate::error::{AppResult, ViewerError};
use crate::export::{snapshot_path, PngExporter, SnapshotExporter};
use crate::geometry::ParameterStore;
use crate::ingest::{self, IngestReport};
use crate::layout::ViewportLayout;
use crate::rate::FrameRateMonitor;
use crate::source::{CaptureControl, ConnectionState, FrameSink};

/// Log one ingestion summary every this many frames.
const FRAME_LOG_INTERVAL: u64 = 100;

pub struct ViewerContext {
    group: String,
    buffers: DoubleBuffer,
    params: Arc<ParameterStore>,
    colormap: ActiveColormap,
    show_profiles: AtomicBool,
    connected: AtomicBool,
    capturing: AtomicBool,
    /// Set while capture is off or the link is down; every delivery that
    /// lands in that state is followed by another blackout.
    held_dark: AtomicBool,
    rate: FrameRateMonitor,
    layout: RwLock<ViewportLayout>,
    control: RwLock<Option<Weak<dyn CaptureControl>>>,
    frames: AtomicU64,
    snapshot_dir: PathBuf,
    exporter: Arc<dyn SnapshotExporter>,
}

impl ViewerContext {
    /// Allocate both frame buffers and the parameter store for `group`.
    ///
    /// Fails if the configured initial geometry does not fit the configured
    /// capacity.
    pub fn new(group: impl Into<String>, config: &ViewerConfig) -> AppResult<Self> {
        let capacity = config.capacity();
        let params = ParameterStore::new(capacity, config.camera.initial)?;
        let group = group.into();

        info!(
            group = %group,
            max_width = capacity.max_width,
            max_height = capacity.max_height,
            colormap = config.display.colormap.key(),
            "Viewer context created"
        );

        Ok(Self {
            group,
            buffers: DoubleBuffer::new(capacity),
            params: Arc::new(params),
            colormap: ActiveColormap::new(config.display.colormap),
            show_profiles: AtomicBool::new(config.display.show_profiles),
            connected: AtomicBool::new(false),
            capturing: AtomicBool::new(false),
            held_dark: AtomicBool::new(false),
            rate: FrameRateMonitor::new(),
            layout: RwLock::new(ViewportLayout::fit(config.viewport(), 0, 0)),
            control: RwLock::new(None),
            frames: AtomicU64::new(0),
            snapshot_dir: config.snapshot_dir(),
            exporter: Arc::new(PngExporter),
        })
    }

    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn SnapshotExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Route [`set_capture`](Self::set_capture) to `control`.
    ///
    /// Only a weak reference is kept. A source usually holds this context as
    /// its sink, and the owner of `control` decides when it is dropped.
    pub fn attach_control(&self, control: Arc<dyn CaptureControl>) {
        *self.control.write() = Some(Arc::downgrade(&control));
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn buffers(&self) -> &DoubleBuffer {
        &self.buffers
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn rate(&self) -> &FrameRateMonitor {
        &self.rate
    }

    /// Ingress frame rate.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.rate.fps()
    }

    #[must_use]
    pub fn frames_received(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn colormap(&self) -> Colormap {
        self.colormap.get()
    }

    /// Takes effect from the next ingested frame.
    pub fn set_colormap(&self, colormap: Colormap) {
        if self.colormap.get() != colormap {
            info!(colormap = colormap.key(), "Colormap changed");
        }
        self.colormap.set(colormap);
    }

    #[must_use]
    pub fn show_profiles(&self) -> bool {
        self.show_profiles.load(Ordering::Relaxed)
    }

    pub fn set_show_profiles(&self, show: bool) {
        self.show_profiles.store(show, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }

    /// `"<group> (connected)"` or `"<group> (disconnected)"`.
    #[must_use]
    pub fn caption(&self) -> String {
        let state = if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        format!("{} ({})", self.group, state.label())
    }

    /// Enable or disable acquisition.
    ///
    /// Disabling zeroes the frame rate and blacks out the display. A frame
    /// already being ingested still completes, and is blacked out again as
    /// soon as it publishes.
    pub fn set_capture(&self, enabled: bool) -> AppResult<()> {
        let control = self.control.read().as_ref().and_then(Weak::upgrade);
        if let Some(control) = control {
            control.set_capture(enabled)?;
        }
        self.apply_capture_state(enabled);
        Ok(())
    }

    /// Zero the free slot and publish it.
    pub fn blackout(&self) -> AppResult<IngestReport> {
        ingest::blackout(&self.buffers, self.params.geometry())
    }

    /// Image column under window `x`, using the last rendered layout.
    #[must_use]
    pub fn screen_to_image_x(&self, sx: f32) -> u32 {
        self.layout.read().screen_to_image_x(sx)
    }

    /// Image row under window `y`, using the last rendered layout.
    #[must_use]
    pub fn screen_to_image_y(&self, sy: f32) -> u32 {
        self.layout.read().screen_to_image_y(sy)
    }

    #[must_use]
    pub fn layout(&self) -> ViewportLayout {
        *self.layout.read()
    }

    /// Store the layout computed by a render pass.
    pub fn record_layout(&self, layout: ViewportLayout) {
        *self.layout.write() = layout;
    }

    /// Write the current frame to `path` with the configured exporter.
    ///
    /// Holds the current slot's read lock for the duration of the export.
    pub fn export_current(&self, path: &Path) -> AppResult<()> {
        let (_, slot) = self.buffers.current_slot();
        let frame = slot.acquire_read();
        if frame.pixel_count() == 0 {
            return Err(ViewerError::Export {
                path: path.to_path_buf(),
                message: "no frame has been received yet".to_string(),
            });
        }
        self.exporter.export(
            frame.processed_bytes(),
            frame.width() as u32,
            frame.height() as u32,
            path,
        )
    }

    /// Export the current frame on a worker thread.
    ///
    /// The file is named after the group and the local time of the request.
    /// Join the handle to learn where it was written or why it failed.
    pub fn take_snapshot(self: &Arc<Self>) -> AppResult<JoinHandle<AppResult<PathBuf>>> {
        let path = snapshot_path(&self.snapshot_dir, &self.group, Local::now());
        let ctx = Arc::clone(self);
        let handle = std::thread::Builder::new()
            .name("camview-snapshot".to_string())
            .spawn(move || -> AppResult<PathBuf> {
                ctx.export_current(&path)?;
                Ok(path)
            })?;
        Ok(handle)
    }

    fn apply_capture_state(&self, enabled: bool) {
        let was = self.capturing.swap(enabled, Ordering::AcqRel);
        if was != enabled {
            info!(group = %self.group, capturing = enabled, "Capture state changed");
        }
        self.held_dark.store(!enabled, Ordering::SeqCst);
        if !enabled {
            self.rate.reset();
            if let Err(e) = self.blackout() {
                warn!(error = %e, "Blackout failed");
            }
        }
    }
}

impl FrameSink for ViewerContext {
    fn on_frame(&self, samples: &[u8]) {
        let geometry = self.params.geometry();
        let result = ingest::ingest(&self.buffers, geometry, self.colormap.get(), samples);

        // A delivery racing a disable or disconnect publishes after that
        // blackout; the display must still end up dark.
        if self.held_dark.load(Ordering::SeqCst) {
            debug!(group = %self.group, "Frame arrived while capture is off");
            if let Err(e) = self.blackout() {
                warn!(error = %e, "Blackout failed");
            }
            return;
        }

        self.rate.record_arrival(Instant::now());
        match result {
            Ok(report) => {
                let count = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
                if count % FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        count,
                        slot = report.slot,
                        sequence = report.sequence,
                        width = geometry.width,
                        height = geometry.height,
                        fps = self.rate.fps(),
                        "Frames ingested"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Frame dropped"),
        }
    }

    fn on_connection(&self, state: ConnectionState) {
        let was = self.connected.swap(state.is_connected(), Ordering::AcqRel);
        if was != state.is_connected() {
            info!(group = %self.group, state = state.label(), "Connection state changed");
        }
        if !state.is_connected() {
            self.apply_capture_state(false);
        }
    }

    fn on_capture_state(&self, capturing: bool) {
        self.apply_capture_state(capturing);
    }
}

impl std::fmt::Debug for ViewerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerContext")
            .field("group", &self.group)
            .field("buffers", &self.buffers)
            .field("colormap", &self.colormap())
            .field("connected", &self.is_connected())
            .field("capturing", &self.is_capturing())
            .field("fps", &self.fps())
            .finish_non_exhaustive()
    }
}
