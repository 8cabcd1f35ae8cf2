//! The render/present loop.
//!
//! Each tick read-locks the current slot, uploads it to the display if it
//! changed since the last upload, draws it fitted to the viewport and
//! optionally overlays the intensity profiles. The loop is then paced by a
//! [`FrameThrottle`]; every time the throttle window rolls, the ingress
//! rate monitor gets a chance to detect a stalled source.
//!
//! The render thread owns the display. Nothing here is called from the
//! ingestion thread, and ingestion never waits for a tick except when it
//! wants the one slot the tick is reading.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::config::ViewerConfig;
use crate::context::ViewerContext;
use crate::frame::Frame;
use crate::layout::{Viewport, ViewportLayout};
use crate::limits::PROFILE_SPAN;
use crate::throttle::{FrameThrottle, Pace};

/// Which profile a curve plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAxis {
    /// Column sums plotted along the bottom of the image.
    Columns,
    /// Row sums plotted along the left of the image.
    Rows,
}

/// A display backend driven by [`RenderLoop`].
///
/// Implementations keep one display resource per slot index.
pub trait DisplaySurface {
    /// Refresh the display resource for `slot` from `frame`.
    fn upload(&mut self, slot: usize, frame: &Frame);

    /// Draw the resource for `slot` at the placement in `layout`.
    fn draw_image(&mut self, slot: usize, layout: &ViewportLayout);

    /// Draw a polyline in window coordinates.
    fn draw_profile(&mut self, axis: ProfileAxis, points: &[[f32; 2]]);
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub slot: usize,
    /// Sequence of the frame that was drawn.
    pub sequence: u64,
    /// Publishes completed when the tick started.
    pub published_before: u64,
    pub uploaded: bool,
    pub layout: ViewportLayout,
}

impl TickReport {
    /// Generations between the newest published frame at tick start and the
    /// frame drawn.
    #[must_use]
    pub fn lag(&self) -> u64 {
        self.published_before.saturating_sub(self.sequence)
    }
}

#[derive(Debug)]
pub struct RenderLoop {
    throttle: FrameThrottle,
    points: Vec<[f32; 2]>,
    ticks: u64,
}

impl RenderLoop {
    pub fn new(throttle: FrameThrottle) -> Self {
        Self {
            throttle,
            points: Vec::new(),
            ticks: 0,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(FrameThrottle::new(
            config.render.target_fps,
            config.stall_window(),
        ))
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn throttle_mut(&mut self) -> &mut FrameThrottle {
        &mut self.throttle
    }

    /// Draw the current frame once.
    pub fn tick<S>(&mut self, ctx: &ViewerContext, surface: &mut S, viewport: Viewport) -> TickReport
    where
        S: DisplaySurface + ?Sized,
    {
        let buffers = ctx.buffers();
        let published_before = buffers.published_count();
        let (slot_index, slot) = buffers.current_slot();

        let frame = slot.acquire_read();
        let uploaded = slot.take_dirty();
        if uploaded {
            surface.upload(slot_index, &frame);
        }

        let layout = ViewportLayout::fit(viewport, frame.width() as u32, frame.height() as u32);
        surface.draw_image(slot_index, &layout);

        if ctx.show_profiles() {
            column_profile_curve(&frame, &layout, &mut self.points);
            surface.draw_profile(ProfileAxis::Columns, &self.points);
            row_profile_curve(&frame, &layout, &mut self.points);
            surface.draw_profile(ProfileAxis::Rows, &self.points);
        }

        let sequence = frame.sequence();
        drop(frame);

        ctx.record_layout(layout);
        self.ticks += 1;

        TickReport {
            slot: slot_index,
            sequence,
            published_before,
            uploaded,
            layout,
        }
    }

    /// Sleep as needed to hold the target rate, and run the stall check
    /// when the throttle window rolls.
    pub fn pace(&mut self, ctx: &ViewerContext) -> Pace {
        let pace = self.throttle.pace();
        if pace.window_rolled && ctx.rate().roll_window() {
            debug!(group = ctx.group(), "Frame source stalled");
        }
        pace
    }

    /// Tick and pace until `stop` is set.
    pub fn run<S>(
        &mut self,
        ctx: &ViewerContext,
        surface: &mut S,
        viewport: Viewport,
        stop: &AtomicBool,
    ) where
        S: DisplaySurface + ?Sized,
    {
        self.throttle.restart();
        while !stop.load(Ordering::Acquire) {
            self.tick(ctx, surface, viewport);
            self.pace(ctx);
        }
        debug!(ticks = self.ticks, "Render loop stopped");
    }
}

/// Column profile as a polyline rising from the bottom edge of the image.
///
/// One point per screen column across the image. Heights are the column
/// mean scaled so a saturated column reaches a fifth of the image height.
pub fn column_profile_curve(frame: &Frame, layout: &ViewportLayout, out: &mut Vec<[f32; 2]>) {
    out.clear();
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 || layout.is_degenerate() {
        return;
    }

    let profile = frame.col_profile();
    let viewport = layout.viewport();
    let (_, offset_y) = layout.offsets();
    let rect = layout.image_rect();

    let span = (viewport.height as f32 - 2.0 * offset_y as f32) * PROFILE_SPAN / 256.0;
    let baseline = viewport.height as f32 - offset_y as f32;

    for sx in rect.left as u32..rect.right() as u32 {
        let col = (layout.screen_to_image_x(sx as f32) as usize).min(width - 1);
        let value = profile[col] as f32 / height as f32 * span;
        out.push([sx as f32, baseline - value]);
    }
}

/// Row profile as a polyline extending right from the left edge of the
/// image, one point per screen row.
pub fn row_profile_curve(frame: &Frame, layout: &ViewportLayout, out: &mut Vec<[f32; 2]>) {
    out.clear();
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 || layout.is_degenerate() {
        return;
    }

    let profile = frame.row_profile();
    let viewport = layout.viewport();
    let (offset_x, _) = layout.offsets();
    let rect = layout.image_rect();

    let span =
        (viewport.drawing_width() as f32 - 2.0 * offset_x as f32) * PROFILE_SPAN / 256.0;

    for sy in rect.top as u32..rect.bottom() as u32 {
        let row = (layout.screen_to_image_y(sy as f32) as usize).min(height - 1);
        let value = profile[row] as f32 / width as f32 * span;
        out.push([rect.left + value, sy as f32]);
    }
}
