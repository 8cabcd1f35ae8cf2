//! Error types for the viewer core.
//!
//! Only contract violations and export failures are surfaced as errors.
//! Connection loss and malformed frame deliveries are absorbed by the
//! ingestion path and show up as observable state instead (connected flag,
//! zeroed frame rate, black image).
//!
//! ## Error Categories
//!
//! 1. **Configuration errors** - `Config`, `Configuration`, `GeometryTooLarge`
//!    - Raised while loading settings or changing camera geometry
//!    - Permanent: the caller must fix the input, nothing is retried
//! 2. **Export errors** - `Export`, `Io`
//!    - Raised by snapshot export and reported to whoever requested it
//!    - Never alter the displayed image
//! 3. **Source errors** - `Source`
//!    - Raised when a frame source cannot be started, stopped or commanded

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the viewer error type.
pub type AppResult<T> = std::result::Result<T, ViewerError>;

/// Primary error type for the viewer core.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Configuration sources could not be parsed or extracted.
    ///
    /// Wraps `figment::Error`, which covers TOML syntax errors, unknown enum
    /// variants (for example an unrecognised colormap name) and type
    /// mismatches in environment overrides.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but holds a semantically invalid value.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Requested camera geometry does not fit the preallocated frame buffers.
    #[error(
        "Camera geometry {width}x{height} exceeds frame buffer capacity {max_width}x{max_height}"
    )]
    GeometryTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    /// Snapshot export failed.
    #[error("Failed to export snapshot to '{path}': {message}")]
    Export { path: PathBuf, message: String },

    /// Frame source could not be started, stopped or commanded.
    #[error("Frame source error: {0}")]
    Source(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    /// Whether this error indicates an upstream programming or configuration
    /// mistake that the process should not try to recover from.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Configuration(_) | Self::GeometryTooLarge { .. }
        )
    }
}
