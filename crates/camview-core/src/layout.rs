//! Viewport fitting and screen/image coordinate mapping.
//!
//! Screen coordinates have their origin at the top-left of the window with
//! `y` growing downwards, matching pointer events. The drawing area starts
//! after a fixed left inset reserved for the settings bar. The image is
//! scaled uniformly to fit the drawing area and centred along the axis with
//! spare room.

use crate::limits::{DEFAULT_LEFT_BAR_WIDTH, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

/// Window size plus the width reserved on the left for controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub left_inset: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, left_inset: u32) -> Self {
        Self {
            width,
            height,
            left_inset,
        }
    }

    /// Width available for the image.
    #[must_use]
    pub fn drawing_width(&self) -> u32 {
        self.width.saturating_sub(self.left_inset)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            DEFAULT_WINDOW_WIDTH,
            DEFAULT_WINDOW_HEIGHT,
            DEFAULT_LEFT_BAR_WIDTH,
        )
    }
}

/// Screen-space rectangle covered by the drawn image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ImageRect {
    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Placement of an image inside a viewport, as computed by a render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportLayout {
    viewport: Viewport,
    image_width: u32,
    image_height: u32,
    scale: f32,
    offset_x: u32,
    offset_y: u32,
}

impl ViewportLayout {
    /// Fit an `image_width` x `image_height` image into `viewport`.
    ///
    /// A zero-sized image or drawing area yields a degenerate layout with a
    /// scale of zero; every query against it maps to the origin.
    #[must_use]
    pub fn fit(viewport: Viewport, image_width: u32, image_height: u32) -> Self {
        let area_w = viewport.drawing_width();
        let area_h = viewport.height;

        if image_width == 0 || image_height == 0 || area_w == 0 || area_h == 0 {
            return Self {
                viewport,
                image_width,
                image_height,
                scale: 0.0,
                offset_x: 0,
                offset_y: 0,
            };
        }

        let x_scale = area_w as f32 / image_width as f32;
        let y_scale = area_h as f32 / image_height as f32;
        let scale = x_scale.min(y_scale);

        let extra_x = (area_w as f32 - image_width as f32 * scale).max(0.0) as u32;
        let extra_y = (area_h as f32 - image_height as f32 * scale).max(0.0) as u32;

        Self {
            viewport,
            image_width,
            image_height,
            scale,
            offset_x: extra_x / 2,
            offset_y: extra_y / 2,
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Screen pixels per image pixel.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Centering offsets inside the drawing area.
    #[must_use]
    pub fn offsets(&self) -> (u32, u32) {
        (self.offset_x, self.offset_y)
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.scale <= 0.0
    }

    #[must_use]
    pub fn image_rect(&self) -> ImageRect {
        let width = self.image_width as f32 * self.scale;
        let height = self.image_height as f32 * self.scale;
        ImageRect {
            left: (self.viewport.left_inset + self.offset_x) as f32,
            top: self.viewport.height as f32 - self.offset_y as f32 - height,
            width,
            height,
        }
    }

    /// Image column under screen `x`, clamped to `[0, width]`.
    #[must_use]
    pub fn screen_to_image_x(&self, sx: f32) -> u32 {
        if self.is_degenerate() {
            return 0;
        }
        let origin = (self.viewport.left_inset + self.offset_x) as f32;
        let x = ((sx - origin) / self.scale).trunc();
        x.clamp(0.0, self.image_width as f32) as u32
    }

    /// Image row under screen `y`, clamped to `[0, height]`.
    ///
    /// Row 0 is at the top of the drawn image.
    #[must_use]
    pub fn screen_to_image_y(&self, sy: f32) -> u32 {
        if self.is_degenerate() {
            return 0;
        }
        let from_bottom = self.viewport.height as f32 - sy - self.offset_y as f32;
        let y = (from_bottom / self.scale).trunc();
        self.image_height - y.clamp(0.0, self.image_height as f32) as u32
    }

    /// Screen `x` of the left edge of image column `x`.
    #[must_use]
    pub fn image_to_screen_x(&self, x: u32) -> f32 {
        (self.viewport.left_inset + self.offset_x) as f32 + x as f32 * self.scale
    }

    /// Screen `y` of the top edge of image row `y`.
    #[must_use]
    pub fn image_to_screen_y(&self, y: u32) -> f32 {
        let from_bottom = self.offset_y as f32
            + self.image_height.saturating_sub(y) as f32 * self.scale;
        self.viewport.height as f32 - from_bottom
    }
}

impl Default for ViewportLayout {
    fn default() -> Self {
        Self::fit(Viewport::default(), 0, 0)
    }
}
