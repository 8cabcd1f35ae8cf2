//! camview - live camera viewer
//!
//! Shows frames from a (simulated) camera identified by a group name, with
//! colormap selection, intensity profiles and PNG snapshots.

mod app;
mod surface;

use anyhow::{anyhow, Context};
use camview_core::{FrameSource, ViewerConfig, ViewerContext};
use camview_driver_mock::MockCamera;
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "camview", version, about = "Live camera viewer")]
struct Cli {
    /// Camera group name; used for the window caption and snapshot names.
    group: String,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ViewerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(group = %cli.group, "Starting camview");

    let viewer = Arc::new(
        ViewerContext::new(cli.group.clone(), &config).context("Failed to create viewer")?,
    );

    let camera = Arc::new(
        MockCamera::builder(Arc::clone(viewer.params()))
            .frame_rate_hz(config.mock.frame_rate_hz)
            .noise(config.mock.noise)
            .build(),
    );
    viewer.attach_control(camera.clone());
    camera
        .start(viewer.clone())
        .context("Failed to start camera")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                config.display.window_width as f32,
                config.display.window_height as f32,
            ])
            .with_title(viewer.caption()),
        ..Default::default()
    };

    let app_viewer = viewer.clone();
    let app_camera = camera.clone();
    let result = eframe::run_native(
        "camview",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ViewerApp::new(
                cc,
                app_viewer,
                app_camera,
                &config,
            )))
        }),
    );

    camera.stop().context("Failed to stop camera")?;
    tracing::info!(frames = viewer.frames_received(), "camview exiting");

    result.map_err(|e| anyhow!("Viewer window failed: {e}"))
}
