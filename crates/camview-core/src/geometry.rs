//! Camera geometry and the parameter store that owns it.
//!
//! The device layer writes parameters (usually from its own callback
//! thread); the ingestion pipeline takes a [`CameraGeometry`] snapshot at
//! the start of every frame. Geometry writes are validated against the
//! preallocated [`FrameCapacity`] so a snapshot can always be trusted to fit
//! the frame buffers.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{AppResult, ViewerError};

/// Fixed maximum dimensions of the frame buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCapacity {
    pub max_width: u32,
    pub max_height: u32,
}

impl FrameCapacity {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Number of samples one frame buffer holds.
    #[must_use]
    pub fn pixels(&self) -> usize {
        self.max_width as usize * self.max_height as usize
    }

    /// Check that `geometry` fits these buffers.
    pub fn check(&self, geometry: &CameraGeometry) -> AppResult<()> {
        if geometry.width == 0 || geometry.height == 0 {
            return Err(ViewerError::Configuration(format!(
                "Camera geometry {}x{} has a zero dimension",
                geometry.width, geometry.height
            )));
        }
        if geometry.width > self.max_width || geometry.height > self.max_height {
            return Err(ViewerError::GeometryTooLarge {
                width: geometry.width,
                height: geometry.height,
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }
        Ok(())
    }
}

/// Active sensor region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraGeometry {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub offset_x: u32,
    #[serde(default)]
    pub offset_y: u32,
}

impl CameraGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            offset_x: 0,
            offset_y: 0,
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset_x: u32, offset_y: u32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    /// Number of samples a frame at this geometry carries.
    #[must_use]
    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Gain control mode reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GainControl {
    Manual,
    #[default]
    Automatic,
}

impl GainControl {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Automatic => "Automatic",
        }
    }
}

/// Trigger source reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    #[default]
    Software,
    Hardware,
}

impl TriggerSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Software => "Software",
            Self::Hardware => "Hardware",
        }
    }

    fn to_repr(self) -> u32 {
        match self {
            Self::Software => 0,
            Self::Hardware => 1,
        }
    }

    fn from_repr(repr: u32) -> Self {
        match repr {
            0 => Self::Software,
            _ => Self::Hardware,
        }
    }
}

/// Device parameters shared between the device layer, ingestion and UI.
///
/// Geometry lives behind a `parking_lot::RwLock` so a snapshot is always a
/// consistent (width, height, offsets) tuple. Scalar settings are atomics.
/// Gain-control mode is broadcast over a `watch` channel so the UI can
/// toggle gain editability when the device switches to automatic gain.
pub struct ParameterStore {
    capacity: FrameCapacity,
    geometry: RwLock<CameraGeometry>,
    exposure_us: AtomicU32,
    gain: AtomicU32,
    trigger: AtomicU32,
    gain_control: watch::Sender<GainControl>,
}

impl ParameterStore {
    /// Default exposure in microseconds.
    pub const DEFAULT_EXPOSURE_US: u32 = 100_000;
    /// Default analog gain.
    pub const DEFAULT_GAIN: u32 = 850;

    /// Create a store with `initial` geometry.
    ///
    /// Fails if `initial` does not fit `capacity`.
    pub fn new(capacity: FrameCapacity, initial: CameraGeometry) -> AppResult<Self> {
        capacity.check(&initial)?;
        let (gain_control, _) = watch::channel(GainControl::default());
        Ok(Self {
            capacity,
            geometry: RwLock::new(initial),
            exposure_us: AtomicU32::new(Self::DEFAULT_EXPOSURE_US),
            gain: AtomicU32::new(Self::DEFAULT_GAIN),
            trigger: AtomicU32::new(TriggerSource::default().to_repr()),
            gain_control,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> FrameCapacity {
        self.capacity
    }

    /// Consistent snapshot of the current geometry.
    #[must_use]
    pub fn geometry(&self) -> CameraGeometry {
        *self.geometry.read()
    }

    /// Replace the geometry.
    ///
    /// A geometry that does not fit the frame buffers is a contract
    /// violation and is rejected without changing the stored value.
    pub fn set_geometry(&self, geometry: CameraGeometry) -> AppResult<()> {
        self.capacity.check(&geometry)?;
        let mut current = self.geometry.write();
        if *current != geometry {
            info!(
                width = geometry.width,
                height = geometry.height,
                offset_x = geometry.offset_x,
                offset_y = geometry.offset_y,
                "Camera geometry changed"
            );
            *current = geometry;
        }
        Ok(())
    }

    pub fn set_width(&self, width: u32) -> AppResult<()> {
        let geometry = CameraGeometry {
            width,
            ..self.geometry()
        };
        self.set_geometry(geometry)
    }

    pub fn set_height(&self, height: u32) -> AppResult<()> {
        let geometry = CameraGeometry {
            height,
            ..self.geometry()
        };
        self.set_geometry(geometry)
    }

    pub fn set_offset(&self, offset_x: u32, offset_y: u32) -> AppResult<()> {
        let geometry = self.geometry().with_offset(offset_x, offset_y);
        self.set_geometry(geometry)
    }

    #[must_use]
    pub fn exposure_us(&self) -> u32 {
        self.exposure_us.load(Ordering::Relaxed)
    }

    pub fn set_exposure_us(&self, exposure_us: u32) {
        self.exposure_us.store(exposure_us, Ordering::Relaxed);
    }

    #[must_use]
    pub fn gain(&self) -> u32 {
        self.gain.load(Ordering::Relaxed)
    }

    pub fn set_gain(&self, gain: u32) {
        self.gain.store(gain, Ordering::Relaxed);
    }

    #[must_use]
    pub fn trigger_source(&self) -> TriggerSource {
        TriggerSource::from_repr(self.trigger.load(Ordering::Relaxed))
    }

    pub fn set_trigger_source(&self, source: TriggerSource) {
        self.trigger.store(source.to_repr(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn gain_control(&self) -> GainControl {
        *self.gain_control.borrow()
    }

    /// Record a gain-control mode change and notify subscribers.
    pub fn set_gain_control(&self, mode: GainControl) {
        let changed = self.gain_control.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });
        if changed {
            debug!(mode = mode.label(), "Gain control mode changed");
        }
    }

    /// Subscribe to gain-control mode changes.
    pub fn subscribe_gain_control(&self) -> watch::Receiver<GainControl> {
        self.gain_control.subscribe()
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("capacity", &self.capacity)
            .field("geometry", &self.geometry())
            .field("exposure_us", &self.exposure_us())
            .field("gain", &self.gain())
            .field("trigger", &self.trigger_source())
            .field("gain_control", &self.gain_control())
            .finish()
    }
}
