use camview_core::{
    AppResult, CaptureControl, ConnectionState, FrameSink, FrameSource, ParameterStore,
    ViewerError,
};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::pattern::fill_test_pattern;

// =============================================================================
// MockCameraBuilder
// =============================================================================

/// Builder for [`MockCamera`].
pub struct MockCameraBuilder {
    params: Arc<ParameterStore>,
    frame_rate_hz: f32,
    noise: bool,
    frame_limit: Option<u64>,
    capturing: bool,
}

impl MockCameraBuilder {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            params,
            frame_rate_hz: 30.0,
            noise: true,
            frame_limit: None,
            capturing: true,
        }
    }

    pub fn frame_rate_hz(mut self, hz: f32) -> Self {
        self.frame_rate_hz = hz.max(0.1);
        self
    }

    pub fn noise(mut self, noise: bool) -> Self {
        self.noise = noise;
        self
    }

    /// Stop capturing on its own after `frames` deliveries.
    pub fn frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Whether capture is enabled when the camera starts.
    pub fn capturing(mut self, capturing: bool) -> Self {
        self.capturing = capturing;
        self
    }

    pub fn build(self) -> MockCamera {
        MockCamera {
            params: self.params,
            period: Duration::from_secs_f32(1.0 / self.frame_rate_hz),
            noise: self.noise,
            frame_limit: self.frame_limit,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                capturing: AtomicBool::new(self.capturing),
                frames_sent: AtomicU64::new(0),
                sink: Mutex::new(None),
                wake_lock: Mutex::new(()),
                wake: Condvar::new(),
            }),
            worker: Mutex::new(None),
        }
    }
}

// =============================================================================
// MockCamera
// =============================================================================

/// Simulated camera that delivers 8-bit test patterns from its own thread.
///
/// Each frame is generated at the geometry currently held by the parameter
/// store, so geometry edits take effect on the next frame. Connection loss
/// can be simulated with [`simulate_disconnect`](Self::simulate_disconnect).
///
/// # Example
///
/// ```rust,ignore
/// let camera = MockCamera::builder(ctx.params().clone()).frame_rate_hz(30.0).build();
/// ctx.attach_control(camera.clone());
/// camera.start(ctx.clone())?;
/// ```
pub struct MockCamera {
    params: Arc<ParameterStore>,
    period: Duration,
    noise: bool,
    frame_limit: Option<u64>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    running: AtomicBool,
    connected: AtomicBool,
    capturing: AtomicBool,
    frames_sent: AtomicU64,
    sink: Mutex<Option<Arc<dyn FrameSink>>>,
    wake_lock: Mutex<()>,
    wake: Condvar,
}

impl Shared {
    fn sink(&self) -> Option<Arc<dyn FrameSink>> {
        self.sink.lock().clone()
    }

    /// Sleep until `deadline` or until woken by a state change.
    fn wait_until(&self, deadline: Instant) {
        let mut guard = self.wake_lock.lock();
        if self.running.load(Ordering::Acquire) {
            self.wake.wait_until(&mut guard, deadline);
        }
    }

    fn wake(&self) {
        let _guard = self.wake_lock.lock();
        self.wake.notify_all();
    }
}

impl MockCamera {
    pub fn builder(params: Arc<ParameterStore>) -> MockCameraBuilder {
        MockCameraBuilder::new(params)
    }

    #[must_use]
    pub fn frames_sent(&self) -> u64 {
        self.shared.frames_sent.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.shared.capturing.load(Ordering::Acquire)
    }

    /// Drop the link. Capture stops and the sink is told.
    pub fn simulate_disconnect(&self) {
        if self.shared.connected.swap(false, Ordering::AcqRel) {
            self.shared.capturing.store(false, Ordering::Release);
            info!("Mock camera disconnected");
            if let Some(sink) = self.shared.sink() {
                sink.on_connection(ConnectionState::Disconnected);
            }
        }
    }

    /// Restore the link. Capture stays off until re-enabled.
    pub fn simulate_reconnect(&self) {
        if !self.shared.connected.swap(true, Ordering::AcqRel) {
            info!("Mock camera reconnected");
            if let Some(sink) = self.shared.sink() {
                sink.on_connection(ConnectionState::Connected);
            }
        }
    }

    fn run(
        shared: Arc<Shared>,
        params: Arc<ParameterStore>,
        sink: Arc<dyn FrameSink>,
        period: Duration,
        noise: bool,
        frame_limit: Option<u64>,
    ) {
        let mut buffer = vec![0u8; params.capacity().pixels()];
        let mut frame_num = 0u64;
        let mut next = Instant::now();

        while shared.running.load(Ordering::Acquire) {
            let live = shared.connected.load(Ordering::Acquire)
                && shared.capturing.load(Ordering::Acquire);

            if live {
                let geometry = params.geometry();
                fill_test_pattern(&mut buffer, geometry.width, geometry.height, frame_num, noise);
                sink.on_frame(&buffer[..geometry.pixels()]);
                frame_num += 1;

                let sent = shared.frames_sent.fetch_add(1, Ordering::Relaxed) + 1;
                if frame_limit.is_some_and(|limit| sent >= limit) {
                    debug!(sent, "Mock camera reached frame limit");
                    shared.capturing.store(false, Ordering::Release);
                    sink.on_capture_state(false);
                }
            }

            next += period;
            let now = Instant::now();
            if next < now {
                next = now;
            }
            shared.wait_until(next);
        }
    }
}

impl CaptureControl for MockCamera {
    fn set_capture(&self, enabled: bool) -> AppResult<()> {
        if enabled && !self.is_connected() {
            return Err(ViewerError::Source(
                "cannot start capture: mock camera is disconnected".to_string(),
            ));
        }
        if self.shared.capturing.swap(enabled, Ordering::AcqRel) != enabled {
            debug!(enabled, "Mock camera capture toggled");
        }
        self.shared.wake();
        Ok(())
    }
}

impl FrameSource for MockCamera {
    fn start(&self, sink: Arc<dyn FrameSink>) -> AppResult<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(ViewerError::Source(
                "mock camera already started".to_string(),
            ));
        }

        *self.shared.sink.lock() = Some(Arc::clone(&sink));
        self.shared.running.store(true, Ordering::Release);
        self.shared.connected.store(true, Ordering::Release);
        sink.on_connection(ConnectionState::Connected);
        sink.on_capture_state(self.is_capturing());

        let shared = Arc::clone(&self.shared);
        let params = Arc::clone(&self.params);
        let (period, noise, frame_limit) = (self.period, self.noise, self.frame_limit);
        let handle = std::thread::Builder::new()
            .name("mock-camera".to_string())
            .spawn(move || Self::run(shared, params, sink, period, noise, frame_limit));

        match handle {
            Ok(handle) => {
                *worker = Some(handle);
                info!(period_ms = period.as_millis() as u64, "Mock camera started");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    fn stop(&self) -> AppResult<()> {
        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };

        self.shared.running.store(false, Ordering::Release);
        self.shared.wake();
        handle
            .join()
            .map_err(|_| ViewerError::Source("mock camera worker panicked".to_string()))?;

        self.shared.connected.store(false, Ordering::Release);
        if let Some(sink) = self.shared.sink.lock().take() {
            sink.on_connection(ConnectionState::Disconnected);
        }
        info!(frames = self.frames_sent(), "Mock camera stopped");
        Ok(())
    }
}

impl Drop for MockCamera {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "Mock camera did not stop cleanly");
        }
    }
}

impl std::fmt::Debug for MockCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCamera")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .field("connected", &self.is_connected())
            .field("capturing", &self.is_capturing())
            .field("frames_sent", &self.frames_sent())
            .finish_non_exhaustive()
    }
}
