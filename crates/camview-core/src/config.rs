//! Layered viewer configuration.
//!
//! Values are resolved in three layers, later ones overriding earlier ones:
//!
//! 1. Built-in defaults from [`ViewerConfig::default`]
//! 2. An optional TOML file
//! 3. Environment variables prefixed `CAMVIEW_`, nested with `__`
//!
//! For example `CAMVIEW_DISPLAY__COLORMAP=grayscale` sets `display.colormap`
//! and `CAMVIEW_RENDER__TARGET_FPS=30` sets `render.target_fps`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::colormap::Colormap;
use crate::error::{AppResult, ViewerError};
use crate::geometry::{CameraGeometry, FrameCapacity};
use crate::layout::Viewport;
use crate::limits;

/// Environment variable naming a default snapshot directory.
pub const SNAPSHOT_DIR_ENV: &str = "CAM_CLIENT_IMG_DIRECTORY";

const ENV_PREFIX: &str = "CAMVIEW_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub camera: CameraSettings,
    pub display: DisplaySettings,
    pub render: RenderSettings,
    pub snapshot: SnapshotSettings,
    pub mock: MockSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Sensor width in pixels; sizes both frame buffers.
    pub max_width: u32,
    /// Sensor height in pixels; sizes both frame buffers.
    pub max_height: u32,
    /// Geometry the parameter store starts with.
    pub initial: CameraGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub colormap: Colormap,
    pub show_profiles: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub left_bar_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub target_fps: f32,
    /// Window after which a silent source reports zero frames per second.
    pub stall_window_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub directory: Option<PathBuf>,
}

/// Settings for the built-in simulated camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    pub frame_rate_hz: f32,
    /// Overlay per-pixel noise on the test pattern.
    pub noise: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            camera: CameraSettings::default(),
            display: DisplaySettings::default(),
            render: RenderSettings::default(),
            snapshot: SnapshotSettings::default(),
            mock: MockSettings::default(),
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            max_width: limits::DEFAULT_MAX_WIDTH,
            max_height: limits::DEFAULT_MAX_HEIGHT,
            initial: CameraGeometry::new(limits::DEFAULT_MAX_WIDTH, limits::DEFAULT_MAX_HEIGHT),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            colormap: Colormap::default(),
            show_profiles: false,
            window_width: limits::DEFAULT_WINDOW_WIDTH,
            window_height: limits::DEFAULT_WINDOW_HEIGHT,
            left_bar_width: limits::DEFAULT_LEFT_BAR_WIDTH,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            target_fps: limits::DEFAULT_TARGET_FPS,
            stall_window_ms: limits::DEFAULT_STALL_WINDOW.as_millis() as u64,
        }
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            frame_rate_hz: 30.0,
            noise: true,
        }
    }
}

impl Provider for ViewerConfig {
    fn metadata(&self) -> figment::Metadata {
        figment::Metadata::named("camview defaults")
    }

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}

impl ViewerConfig {
    /// Load defaults, then `path` if given, then the environment, and
    /// validate the result.
    ///
    /// A `path` that does not exist is an error; omitting it is not.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut figment = Figment::from(ViewerConfig::default());

        if let Some(path) = path {
            if !path.exists() {
                return Err(ViewerError::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: ViewerConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ViewerError::Configuration(format!(
                "invalid log_level '{}', expected one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.camera.max_width == 0 || self.camera.max_height == 0 {
            return Err(ViewerError::Configuration(
                "camera.max_width and camera.max_height must be non-zero".to_string(),
            ));
        }
        self.capacity().check(&self.camera.initial)?;

        if !(self.render.target_fps.is_finite() && self.render.target_fps > 0.0) {
            return Err(ViewerError::Configuration(format!(
                "render.target_fps must be positive, got {}",
                self.render.target_fps
            )));
        }
        if self.render.stall_window_ms == 0 {
            return Err(ViewerError::Configuration(
                "render.stall_window_ms must be non-zero".to_string(),
            ));
        }
        if !(self.mock.frame_rate_hz.is_finite() && self.mock.frame_rate_hz > 0.0) {
            return Err(ViewerError::Configuration(format!(
                "mock.frame_rate_hz must be positive, got {}",
                self.mock.frame_rate_hz
            )));
        }
        if self.display.window_width == 0 || self.display.window_height == 0 {
            return Err(ViewerError::Configuration(
                "display window dimensions must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn capacity(&self) -> FrameCapacity {
        FrameCapacity::new(self.camera.max_width, self.camera.max_height)
    }

    #[must_use]
    pub fn stall_window(&self) -> Duration {
        Duration::from_millis(self.render.stall_window_ms)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            self.display.window_width,
            self.display.window_height,
            self.display.left_bar_width,
        )
    }

    /// Directory snapshots are written to.
    #[must_use]
    pub fn snapshot_dir(&self) -> PathBuf {
        resolve_snapshot_dir(
            self.snapshot.directory.as_deref(),
            std::env::var_os(SNAPSHOT_DIR_ENV).map(PathBuf::from),
        )
    }
}

/// Pick the snapshot directory: explicit setting, then the environment
/// override, then the home directory, then `/tmp`.
pub fn resolve_snapshot_dir(configured: Option<&Path>, from_env: Option<PathBuf>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .or(from_env.filter(|dir| !dir.as_os_str().is_empty()))
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.display.colormap, Colormap::HotCold);
        assert_eq!(config.capacity(), FrameCapacity::new(1296, 966));
        assert_eq!(config.stall_window(), Duration::from_secs(2));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[display]
colormap = "grayscale"
show_profiles = true

[camera.initial]
width = 640
height = 480
"#
        )
        .unwrap();

        let config = ViewerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.display.colormap, Colormap::Grayscale);
        assert!(config.display.show_profiles);
        assert_eq!(config.camera.initial, CameraGeometry::new(640, 480));
        // Untouched sections keep their defaults.
        assert_eq!(config.render.target_fps, 20.0);
    }

    #[test]
    fn unknown_colormap_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\ncolormap = \"rainbow\"").unwrap();
        let err = ViewerConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ViewerError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn initial_geometry_over_capacity_is_rejected() {
        let mut config = ViewerConfig::default();
        config.camera.initial = CameraGeometry::new(2000, 100);
        assert!(matches!(
            config.validate(),
            Err(ViewerError::GeometryTooLarge { .. })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = ViewerConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.render.target_fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.camera.initial = CameraGeometry::new(0, 10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ViewerConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ViewerError::Configuration(_))));
    }

    #[test]
    fn snapshot_dir_prefers_config_then_env() {
        let configured = PathBuf::from("/data/shots");
        let env = Some(PathBuf::from("/env/shots"));

        assert_eq!(
            resolve_snapshot_dir(Some(&configured), env.clone()),
            configured
        );
        assert_eq!(resolve_snapshot_dir(None, env), PathBuf::from("/env/shots"));

        let fallback = resolve_snapshot_dir(None, Some(PathBuf::new()));
        assert_eq!(
            fallback,
            dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
        );
    }
}
