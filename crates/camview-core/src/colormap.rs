//! Grayscale to RGB colormaps.
//!
//! Each colormap is a set of three pure, piecewise-linear channel functions
//! over 8-bit intensities. The set is closed: adding a scheme means adding a
//! variant, and every `match` below fails to compile until it is handled.
//!
//! Hot-cold breakpoints sit at 64, 128 and 192. Ramps are computed in 8-bit
//! wrapping arithmetic, so `(v - 192) * 4` for `v` in `129..192` yields the
//! ascending values 4..=252 rather than saturating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::ViewerError;

/// One processed pixel.
pub type Rgb = [u8; 3];

/// Colormap for frame display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Colormap {
    Grayscale,
    #[default]
    HotCold,
}

impl Colormap {
    /// All selectable colormaps, in UI order.
    pub const ALL: [Colormap; 2] = [Colormap::Grayscale, Colormap::HotCold];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Grayscale => "Grayscale",
            Self::HotCold => "Hot-cold",
        }
    }

    /// Configuration key for this colormap.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::HotCold => "hot-cold",
        }
    }

    #[inline]
    #[must_use]
    pub fn red(&self, v: u8) -> u8 {
        match self {
            Self::Grayscale => v,
            Self::HotCold => {
                if v <= 128 {
                    0
                } else if v >= 192 {
                    255
                } else {
                    v.wrapping_sub(192).wrapping_mul(4)
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn green(&self, v: u8) -> u8 {
        match self {
            Self::Grayscale => v,
            Self::HotCold => {
                if v < 64 {
                    v.wrapping_mul(4)
                } else if v <= 192 {
                    255
                } else {
                    // (256 - v) * 4 in 8-bit arithmetic
                    0u8.wrapping_sub(v).wrapping_mul(4)
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn blue(&self, v: u8) -> u8 {
        match self {
            Self::Grayscale => v,
            Self::HotCold => {
                if v <= 64 {
                    255
                } else if v >= 128 {
                    0
                } else {
                    128u8.wrapping_sub(v).wrapping_mul(4)
                }
            }
        }
    }

    /// Map an intensity to an RGB triple.
    #[inline]
    #[must_use]
    pub fn apply(&self, v: u8) -> Rgb {
        [self.red(v), self.green(v), self.blue(v)]
    }

    fn to_repr(self) -> u8 {
        match self {
            Self::Grayscale => 0,
            Self::HotCold => 1,
        }
    }

    fn from_repr(repr: u8) -> Self {
        match repr {
            0 => Self::Grayscale,
            _ => Self::HotCold,
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Colormap {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grayscale" | "greyscale" | "gray" => Ok(Self::Grayscale),
            "hot-cold" | "hotcold" => Ok(Self::HotCold),
            other => Err(ViewerError::Configuration(format!(
                "Unknown colormap '{}'. Must be one of: grayscale, hot-cold",
                other
            ))),
        }
    }
}

/// The colormap applied to newly ingested frames.
///
/// Swapping it is a single atomic store. A frame already being ingested
/// keeps the colormap it loaded at its start; frames already published are
/// never recolored.
#[derive(Debug)]
pub struct ActiveColormap(AtomicU8);

impl ActiveColormap {
    pub fn new(colormap: Colormap) -> Self {
        Self(AtomicU8::new(colormap.to_repr()))
    }

    #[must_use]
    pub fn get(&self) -> Colormap {
        Colormap::from_repr(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, colormap: Colormap) {
        self.0.store(colormap.to_repr(), Ordering::Release);
    }
}

impl Default for ActiveColormap {
    fn default() -> Self {
        Self::new(Colormap::default())
    }
}
