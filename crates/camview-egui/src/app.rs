//! Viewer window: settings side bar plus the live image.

use camview_core::{
    AppResult, CameraGeometry, Colormap, GainControl, RenderLoop, TriggerSource, ViewerConfig,
    ViewerContext, Viewport,
};
use camview_driver_mock::MockCamera;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::surface::{EguiSurface, SlotTextures};

pub struct ViewerApp {
    viewer: Arc<ViewerContext>,
    camera: Arc<MockCamera>,
    render: RenderLoop,
    textures: SlotTextures,
    left_bar_width: f32,
    gain_control: watch::Receiver<GainControl>,
    geometry: CameraGeometry,
    caption: String,
    render_fps: f32,
    pointer: Option<(u32, u32)>,
    snapshot: Option<JoinHandle<AppResult<PathBuf>>>,
    status: Option<String>,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        viewer: Arc<ViewerContext>,
        camera: Arc<MockCamera>,
        config: &ViewerConfig,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let gain_control = viewer.params().subscribe_gain_control();
        let geometry = viewer.params().geometry();
        Self {
            render: RenderLoop::from_config(config),
            textures: SlotTextures::default(),
            left_bar_width: config.display.left_bar_width as f32,
            gain_control,
            geometry,
            caption: String::new(),
            render_fps: 0.0,
            pointer: None,
            snapshot: None,
            status: None,
            viewer,
            camera,
        }
    }

    fn sync_caption(&mut self, ctx: &egui::Context) {
        let caption = self.viewer.caption();
        if caption != self.caption {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(caption.clone()));
            self.caption = caption;
        }
    }

    fn poll_snapshot(&mut self) {
        if !self.snapshot.as_ref().is_some_and(JoinHandle::is_finished) {
            return;
        }
        let Some(handle) = self.snapshot.take() else {
            return;
        };
        self.status = Some(match handle.join() {
            Ok(Ok(path)) => format!("Saved {}", path.display()),
            Ok(Err(e)) => {
                warn!(error = %e, "Snapshot failed");
                format!("Snapshot failed: {e}")
            }
            Err(_) => "Snapshot worker panicked".to_string(),
        });
    }

    fn report(&mut self, result: AppResult<()>) {
        if let Err(e) = result {
            warn!(error = %e, "Settings change rejected");
            self.status = Some(e.to_string());
        }
    }

    fn settings_panel(&mut self, ui: &mut egui::Ui) {
        let params = Arc::clone(self.viewer.params());

        ui.heading(self.viewer.group());
        let connected = self.viewer.is_connected();
        ui.label(if connected { "Connected" } else { "Disconnected" });
        ui.separator();

        // Geometry edits are applied as a whole so a rejected value does not
        // leave a half-updated region.
        let capacity = params.capacity();
        let mut geometry = self.geometry;
        egui::Grid::new("geometry").num_columns(2).show(ui, |ui| {
            ui.label("Width");
            ui.add(egui::DragValue::new(&mut geometry.width).range(1..=capacity.max_width));
            ui.end_row();
            ui.label("Height");
            ui.add(egui::DragValue::new(&mut geometry.height).range(1..=capacity.max_height));
            ui.end_row();
            ui.label("Offset X");
            ui.add(egui::DragValue::new(&mut geometry.offset_x));
            ui.end_row();
            ui.label("Offset Y");
            ui.add(egui::DragValue::new(&mut geometry.offset_y));
            ui.end_row();
        });
        if geometry != self.geometry {
            let result = params.set_geometry(geometry);
            if result.is_ok() {
                self.geometry = geometry;
            }
            self.report(result);
        }

        let gain_editable = *self.gain_control.borrow_and_update() == GainControl::Manual;
        egui::Grid::new("exposure").num_columns(2).show(ui, |ui| {
            ui.label("Exposure (us)");
            let mut exposure = params.exposure_us();
            if ui.add(egui::DragValue::new(&mut exposure)).changed() {
                params.set_exposure_us(exposure);
            }
            ui.end_row();

            ui.label("Gain");
            let mut gain = params.gain();
            let response = ui.add_enabled(gain_editable, egui::DragValue::new(&mut gain));
            if response.changed() {
                params.set_gain(gain);
            }
            ui.end_row();

            ui.label("Gain control");
            let mut mode = params.gain_control();
            egui::ComboBox::from_id_salt("gain_control")
                .selected_text(mode.label())
                .show_ui(ui, |ui| {
                    for option in [GainControl::Manual, GainControl::Automatic] {
                        ui.selectable_value(&mut mode, option, option.label());
                    }
                });
            if mode != params.gain_control() {
                params.set_gain_control(mode);
            }
            ui.end_row();

            ui.label("Trigger");
            let mut trigger = params.trigger_source();
            egui::ComboBox::from_id_salt("trigger")
                .selected_text(trigger.label())
                .show_ui(ui, |ui| {
                    for option in [TriggerSource::Software, TriggerSource::Hardware] {
                        ui.selectable_value(&mut trigger, option, option.label());
                    }
                });
            if trigger != params.trigger_source() {
                params.set_trigger_source(trigger);
            }
            ui.end_row();
        });
        ui.separator();

        match self.pointer {
            Some((x, y)) => ui.label(format!("Mouse: ({x}, {y})")),
            None => ui.label("Mouse: -"),
        };

        let mut colormap = self.viewer.colormap();
        egui::ComboBox::from_label("Colormap")
            .selected_text(colormap.label())
            .show_ui(ui, |ui| {
                for option in Colormap::ALL {
                    ui.selectable_value(&mut colormap, option, option.label());
                }
            });
        self.viewer.set_colormap(colormap);

        let mut show_profiles = self.viewer.show_profiles();
        if ui.checkbox(&mut show_profiles, "Show profiles").changed() {
            self.viewer.set_show_profiles(show_profiles);
        }

        let mut capturing = self.viewer.is_capturing();
        let toggle = ui.add_enabled(connected, egui::Checkbox::new(&mut capturing, "Capturing"));
        if toggle.changed() {
            let result = self.viewer.set_capture(capturing);
            self.report(result);
        }
        ui.separator();

        ui.label(format!("Camera: {:.1} fps", self.viewer.fps()));
        ui.label(format!("Display: {:.1} fps", self.render_fps));
        ui.separator();

        let idle = self.snapshot.is_none();
        if ui
            .add_enabled(idle, egui::Button::new("Snapshot"))
            .clicked()
        {
            match self.viewer.take_snapshot() {
                Ok(handle) => self.snapshot = Some(handle),
                Err(e) => self.status = Some(format!("Snapshot failed: {e}")),
            }
        }

        let link_label = if connected {
            "Simulate disconnect"
        } else {
            "Reconnect"
        };
        if ui.button(link_label).clicked() {
            if connected {
                self.camera.simulate_disconnect();
            } else {
                self.camera.simulate_reconnect();
            }
        }

        if let Some(status) = &self.status {
            ui.separator();
            ui.label(status);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Q)) {
            info!("Quit requested");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // The device may have been re-configured behind our back.
        self.geometry = self.viewer.params().geometry();
        self.poll_snapshot();
        self.sync_caption(ctx);

        egui::SidePanel::left("settings")
            .exact_width(self.left_bar_width)
            .resizable(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.settings_panel(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let screen = ctx.screen_rect();
                let panel = ui.max_rect();
                let viewport = Viewport::new(
                    screen.width() as u32,
                    screen.height() as u32,
                    panel.left().max(0.0) as u32,
                );

                let painter = ui.painter().clone();
                let mut surface = EguiSurface::new(ctx, &painter, &mut self.textures);
                self.render.tick(&self.viewer, &mut surface, viewport);

                self.pointer = ui.input(|i| i.pointer.hover_pos()).and_then(|pos| {
                    panel.contains(pos).then(|| {
                        (
                            self.viewer.screen_to_image_x(pos.x),
                            self.viewer.screen_to_image_y(pos.y),
                        )
                    })
                });
            });

        self.render_fps = self.render.pace(&self.viewer).achieved_fps;
        ctx.request_repaint();
    }
}
