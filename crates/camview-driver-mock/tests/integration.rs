//! Mock camera driving a real viewer context.

use camview_core::{
    CameraGeometry, FrameSink, FrameSource, ViewerConfig, ViewerContext,
};
use camview_driver_mock::MockCamera;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn context() -> Arc<ViewerContext> {
    let mut config = ViewerConfig::default();
    config.camera.max_width = 128;
    config.camera.max_height = 96;
    config.camera.initial = CameraGeometry::new(128, 96);
    Arc::new(ViewerContext::new("mock", &config).unwrap())
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn frames_flow_into_context() {
    let ctx = context();
    let camera = Arc::new(
        MockCamera::builder(ctx.params().clone())
            .frame_rate_hz(200.0)
            .build(),
    );
    ctx.attach_control(camera.clone());
    camera.start(ctx.clone() as Arc<dyn FrameSink>).unwrap();

    assert!(wait_for(|| ctx.frames_received() >= 10));
    assert!(ctx.is_connected());
    assert!(ctx.is_capturing());
    assert!(ctx.fps() > 0.0);
    assert_eq!(ctx.caption(), "mock (connected)");

    let (_, slot) = ctx.buffers().current_slot();
    let frame = slot.acquire_read();
    assert_eq!((frame.width(), frame.height()), (128, 96));
    assert!(frame.original().iter().any(|&v| v != 0));
    drop(frame);

    camera.stop().unwrap();
    assert!(!ctx.is_connected());
}

#[test]
fn geometry_change_applies_to_next_frames() {
    let ctx = context();
    let camera = Arc::new(
        MockCamera::builder(ctx.params().clone())
            .frame_rate_hz(200.0)
            .build(),
    );
    camera.start(ctx.clone() as Arc<dyn FrameSink>).unwrap();
    assert!(wait_for(|| ctx.frames_received() >= 2));

    ctx.params().set_geometry(CameraGeometry::new(64, 32)).unwrap();
    assert!(wait_for(|| {
        let (_, slot) = ctx.buffers().current_slot();
        let frame = slot.acquire_read();
        (frame.width(), frame.height()) == (64, 32)
    }));

    camera.stop().unwrap();
}

#[test]
fn disabling_capture_blacks_out_display() {
    let ctx = context();
    let camera = Arc::new(
        MockCamera::builder(ctx.params().clone())
            .frame_rate_hz(1000.0)
            .build(),
    );
    ctx.attach_control(camera.clone());
    camera.start(ctx.clone() as Arc<dyn FrameSink>).unwrap();

    for round in 0..20 {
        ctx.set_capture(true).unwrap();
        let from = ctx.frames_received();
        assert!(wait_for(|| ctx.frames_received() > from + 2));

        ctx.set_capture(false).unwrap();
        // Any delivery that was in flight has landed by now.
        std::thread::sleep(Duration::from_millis(10));

        assert!(!ctx.is_capturing());
        assert_eq!(ctx.fps(), 0.0);
        let (_, slot) = ctx.buffers().current_slot();
        assert!(
            slot.acquire_read().original().iter().all(|&v| v == 0),
            "live image shown after disable in round {round}"
        );
    }

    camera.stop().unwrap();
}

#[test]
fn dropping_camera_without_stop_disconnects() {
    let ctx = context();
    let camera = Arc::new(
        MockCamera::builder(ctx.params().clone())
            .frame_rate_hz(200.0)
            .build(),
    );
    ctx.attach_control(camera.clone());
    camera.start(ctx.clone() as Arc<dyn FrameSink>).unwrap();
    assert!(wait_for(|| ctx.frames_received() >= 2));

    drop(camera);
    assert!(!ctx.is_connected());
    assert!(!ctx.is_capturing());
    assert_eq!(Arc::strong_count(&ctx), 1);
}

#[test]
fn simulated_disconnect_stops_capture_and_blacks_out() {
    let ctx = context();
    let camera = Arc::new(
        MockCamera::builder(ctx.params().clone())
            .frame_rate_hz(200.0)
            .build(),
    );
    ctx.attach_control(camera.clone());
    camera.start(ctx.clone() as Arc<dyn FrameSink>).unwrap();
    assert!(wait_for(|| ctx.frames_received() >= 3));

    camera.simulate_disconnect();
    assert!(!ctx.is_connected());
    assert!(!ctx.is_capturing());
    assert_eq!(ctx.caption(), "mock (disconnected)");
    assert!(ctx.set_capture(true).is_err());

    camera.simulate_reconnect();
    ctx.set_capture(true).unwrap();
    let resumed_from = ctx.frames_received();
    assert!(wait_for(|| ctx.frames_received() > resumed_from));

    camera.stop().unwrap();
}
