//! Render loop behaviour against a recording display surface.

use camview_core::{
    CameraGeometry, DisplaySurface, Frame, FrameSink, FrameThrottle, ProfileAxis, RenderLoop,
    ViewerConfig, ViewerContext, Viewport, ViewportLayout,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingSurface {
    uploads: Vec<(usize, u64)>,
    draws: Vec<usize>,
    profiles: Vec<(ProfileAxis, usize)>,
}

impl DisplaySurface for RecordingSurface {
    fn upload(&mut self, slot: usize, frame: &Frame) {
        self.uploads.push((slot, frame.sequence()));
    }

    fn draw_image(&mut self, slot: usize, _layout: &ViewportLayout) {
        self.draws.push(slot);
    }

    fn draw_profile(&mut self, axis: ProfileAxis, points: &[[f32; 2]]) {
        self.profiles.push((axis, points.len()));
    }
}

fn context() -> ViewerContext {
    let mut config = ViewerConfig::default();
    config.camera.max_width = 64;
    config.camera.max_height = 48;
    config.camera.initial = CameraGeometry::new(64, 48);
    ViewerContext::new("bench", &config).unwrap()
}

fn viewport() -> Viewport {
    Viewport::new(800, 600, 200)
}

#[test]
fn uploads_only_when_slot_changed() {
    let ctx = context();
    let mut render = RenderLoop::new(FrameThrottle::new(1000.0, Duration::from_secs(2)));
    let mut surface = RecordingSurface::default();

    // Fresh slots start flagged so the first tick creates a resource.
    assert!(render.tick(&ctx, &mut surface, viewport()).uploaded);
    assert!(!render.tick(&ctx, &mut surface, viewport()).uploaded);

    ctx.on_frame(&[90; 64 * 48]);
    let report = render.tick(&ctx, &mut surface, viewport());
    assert!(report.uploaded);
    assert_eq!(report.sequence, 1);
    assert_eq!(report.lag(), 0);
    assert_eq!(surface.uploads.last(), Some(&(report.slot, 1)));

    assert!(!render.tick(&ctx, &mut surface, viewport()).uploaded);
    assert_eq!(surface.draws.len(), 4);
    assert_eq!(render.ticks(), 4);
}

#[test]
fn tick_records_layout_for_coordinate_queries() {
    let ctx = context();
    let mut render = RenderLoop::new(FrameThrottle::default());
    let mut surface = RecordingSurface::default();

    ctx.on_frame(&[10; 64 * 48]);
    let report = render.tick(&ctx, &mut surface, viewport());
    assert_eq!(ctx.layout(), report.layout);
    assert_eq!(report.layout.image_size(), (64, 48));

    let rect = report.layout.image_rect();
    assert_eq!(ctx.screen_to_image_x(rect.left), 0);
    assert_eq!(ctx.screen_to_image_x(rect.right() + 50.0), 64);
}

#[test]
fn profiles_drawn_only_when_enabled() {
    let ctx = context();
    let mut render = RenderLoop::new(FrameThrottle::default());
    let mut surface = RecordingSurface::default();
    ctx.on_frame(&[128; 64 * 48]);

    render.tick(&ctx, &mut surface, viewport());
    assert!(surface.profiles.is_empty());

    ctx.set_show_profiles(true);
    render.tick(&ctx, &mut surface, viewport());
    let axes: Vec<_> = surface.profiles.iter().map(|(axis, _)| *axis).collect();
    assert_eq!(axes, vec![ProfileAxis::Columns, ProfileAxis::Rows]);
    assert!(surface.profiles.iter().all(|(_, n)| *n > 0));
}

#[test]
fn stalled_source_reports_zero_rate() {
    let ctx = context();
    let mut render = RenderLoop::new(FrameThrottle::new(200.0, Duration::from_millis(20)));
    let mut surface = RecordingSurface::default();

    ctx.on_frame(&[1; 64 * 48]);
    std::thread::sleep(Duration::from_millis(5));
    ctx.on_frame(&[2; 64 * 48]);
    assert!(ctx.fps() > 0.0);

    // First window saw frames, the following ones see none.
    let mut rolls = 0;
    while rolls < 2 {
        render.tick(&ctx, &mut surface, viewport());
        if render.pace(&ctx).window_rolled {
            rolls += 1;
        }
    }
    assert_eq!(ctx.fps(), 0.0);
}

#[test]
fn render_never_lags_more_than_one_generation() {
    let ctx = Arc::new(context());
    let stop = AtomicBool::new(false);

    std::thread::scope(|s| {
        let producer = s.spawn(|| {
            let mut samples = vec![0u8; 64 * 48];
            for n in 0..2_000u32 {
                samples.fill((n % 256) as u8);
                ctx.on_frame(&samples);
            }
            stop.store(true, Ordering::Release);
        });

        let mut render = RenderLoop::new(FrameThrottle::new(10_000.0, Duration::from_secs(2)));
        let mut surface = RecordingSurface::default();
        while !stop.load(Ordering::Acquire) {
            let report = render.tick(&ctx, &mut surface, viewport());
            assert!(report.lag() <= 1, "lag {}", report.lag());
        }
        producer.join().unwrap();
    });

    assert_eq!(ctx.frames_received(), 2_000);
}

#[test]
fn run_stops_when_flag_set() {
    let ctx = context();
    let stop = AtomicBool::new(false);
    let mut render = RenderLoop::new(FrameThrottle::new(500.0, Duration::from_secs(2)));

    std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(50));
            stop.store(true, Ordering::Release);
        });
        let mut surface = RecordingSurface::default();
        render.run(&ctx, &mut surface, viewport(), &stop);
    });

    // 50 ms at 500 Hz is about 25 ticks; the throttle must have held it down.
    assert!(render.ticks() > 0);
    assert!(render.ticks() < 200, "ticks {}", render.ticks());
}
