//! Snapshot export of the processed image.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{AppResult, ViewerError};

/// Timestamp layout used in snapshot file names.
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Writes a processed RGB image to disk.
///
/// Called with the frame's read lock held, so implementations must not
/// block on anything the ingestion thread could be holding.
pub trait SnapshotExporter: Send + Sync {
    /// `pixels` is packed RGB, row-major, exactly `width * height * 3` bytes.
    fn export(&self, pixels: &[u8], width: u32, height: u32, path: &Path) -> AppResult<()>;
}

/// PNG exporter backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngExporter;

impl SnapshotExporter for PngExporter {
    fn export(&self, pixels: &[u8], width: u32, height: u32, path: &Path) -> AppResult<()> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected || expected == 0 {
            return Err(ViewerError::Export {
                path: path.to_path_buf(),
                message: format!(
                    "expected {expected} bytes for a {width}x{height} RGB image, got {}",
                    pixels.len()
                ),
            });
        }

        image::save_buffer_with_format(
            path,
            pixels,
            width,
            height,
            image::ExtendedColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .map_err(|e| {
            warn!(path = %path.display(), error = %e, "Snapshot export failed");
            ViewerError::Export {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        info!(path = %path.display(), width, height, "Snapshot written");
        Ok(())
    }
}

/// `<dir>/<group>_<timestamp>.png`
pub fn snapshot_path(dir: &Path, group: &str, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("{group}_{}.png", at.format(SNAPSHOT_TIME_FORMAT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn path_embeds_group_and_local_time() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        let path = snapshot_path(Path::new("/shots"), "cam1", at);
        assert_eq!(path, PathBuf::from("/shots/cam1_2024-03-07_09:05:01.png"));
    }

    #[test]
    fn png_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let pixels: Vec<u8> = (0..2 * 3 * 3).map(|i| (i * 10) as u8).collect();

        PngExporter.export(&pixels, 3, 2, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.as_raw(), &pixels);
    }

    #[test]
    fn size_mismatch_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let err = PngExporter.export(&[0; 5], 2, 2, &path).unwrap_err();
        assert!(matches!(err, ViewerError::Export { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_directory_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.png");
        let err = PngExporter.export(&[0; 12], 2, 2, &path).unwrap_err();
        assert!(matches!(err, ViewerError::Export { .. }));
    }
}
