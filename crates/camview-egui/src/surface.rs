//! egui implementation of the render loop's display surface.

use camview_core::{DisplaySurface, Frame, ProfileAxis, ViewportLayout};
use eframe::egui;

const COLUMN_PROFILE_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 255, 0);
const ROW_PROFILE_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 255, 255);

/// One texture per frame slot, created on first upload and updated in place
/// afterwards.
#[derive(Default)]
pub struct SlotTextures {
    textures: [Option<egui::TextureHandle>; 2],
}

impl SlotTextures {
    fn upload(&mut self, ctx: &egui::Context, slot: usize, frame: &Frame) {
        if frame.pixel_count() == 0 {
            return;
        }
        let size = [frame.width(), frame.height()];
        let image = egui::ColorImage::from_rgb(size, frame.processed_bytes());

        match &mut self.textures[slot] {
            Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
            none => {
                *none = Some(ctx.load_texture(
                    format!("camera_slot_{slot}"),
                    image,
                    egui::TextureOptions::NEAREST,
                ));
            }
        }
    }

    fn get(&self, slot: usize) -> Option<&egui::TextureHandle> {
        self.textures[slot].as_ref()
    }
}

/// Borrowed drawing state for one egui pass.
pub struct EguiSurface<'a> {
    ctx: &'a egui::Context,
    painter: &'a egui::Painter,
    textures: &'a mut SlotTextures,
}

impl<'a> EguiSurface<'a> {
    pub fn new(
        ctx: &'a egui::Context,
        painter: &'a egui::Painter,
        textures: &'a mut SlotTextures,
    ) -> Self {
        Self {
            ctx,
            painter,
            textures,
        }
    }
}

impl DisplaySurface for EguiSurface<'_> {
    fn upload(&mut self, slot: usize, frame: &Frame) {
        self.textures.upload(self.ctx, slot, frame);
    }

    fn draw_image(&mut self, slot: usize, layout: &ViewportLayout) {
        if layout.is_degenerate() {
            return;
        }
        let Some(texture) = self.textures.get(slot) else {
            return;
        };
        let r = layout.image_rect();
        let rect = egui::Rect::from_min_size(egui::pos2(r.left, r.top), egui::vec2(r.width, r.height));
        self.painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    fn draw_profile(&mut self, axis: ProfileAxis, points: &[[f32; 2]]) {
        if points.len() < 2 {
            return;
        }
        let color = match axis {
            ProfileAxis::Columns => COLUMN_PROFILE_COLOR,
            ProfileAxis::Rows => ROW_PROFILE_COLOR,
        };
        let line = points.iter().map(|&[x, y]| egui::pos2(x, y)).collect();
        self.painter
            .add(egui::Shape::line(line, egui::Stroke::new(1.0, color)));
    }
}
