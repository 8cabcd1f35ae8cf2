//! 8-bit test pattern for simulated frames.

/// glibc-style LCG step, reproducible across platforms.
#[inline]
fn prng(seed: u64) -> u64 {
    seed.wrapping_mul(1103515245).wrapping_add(12345) & 0x7fffffff
}

/// Fill `buffer` with a `width` x `height` diagnostic pattern.
///
/// Layers, back to front:
/// - checkerboard background, optionally with per-pixel noise
/// - horizontal gradient bars along the top and bottom edges, ascending and
///   descending, so every colormap breakpoint is on screen
/// - a solid triangle in the top-left corner marking the image origin
/// - a centre crosshair
/// - a Gaussian hotspot orbiting the centre, one revolution per ~125 frames
///
/// Images under 32 pixels on a side get a plain diagonal gradient that
/// shifts with `frame_num`. `buffer` must hold at least `width * height`
/// samples; anything beyond is left alone.
pub fn fill_test_pattern(buffer: &mut [u8], width: u32, height: u32, frame_num: u64, noise: bool) {
    let w = width as usize;
    let h = height as usize;
    let buffer = &mut buffer[..w * h];

    if w < 32 || h < 32 {
        let shift = (frame_num % 256) as usize;
        for (idx, px) in buffer.iter_mut().enumerate() {
            let (x, y) = (idx % w, idx / w);
            *px = (((x + y) * 255 / (w + h).max(1) + shift) % 256) as u8;
        }
        return;
    }

    let checker = (w.min(h) / 16).max(1);
    let bar_height = (h / 10).max(1);
    let corner = (w.min(h) / 8).max(1);
    let arm = (w.min(h) / 6).max(1);
    let (cx, cy) = (w / 2, h / 2);

    let orbit = w.min(h) as f64 / 5.0;
    let angle = (frame_num as f64 * 0.05) % std::f64::consts::TAU;
    let hot_x = cx as f64 + orbit * angle.cos();
    let hot_y = cy as f64 + orbit * angle.sin();
    let sigma = (w.min(h) as f64 / 16.0).max(2.0);
    let two_sigma_sq = 2.0 * sigma * sigma;

    let frame_seed = frame_num.wrapping_mul(2654435761);

    for (y, row) in buffer.chunks_exact_mut(w).enumerate() {
        for (x, px) in row.iter_mut().enumerate() {
            let mut value: i32 = if (x / checker + y / checker) % 2 == 0 {
                64
            } else {
                77
            };
            if noise {
                let n = prng(frame_seed ^ (y * w + x) as u64);
                value += (n & 0xF) as i32 - 8;
            }

            if y < bar_height {
                value = (x * 255 / (w - 1)) as i32;
            } else if y >= h - bar_height {
                value = ((w - 1 - x) * 255 / (w - 1)) as i32;
            }

            if x + y < corner {
                value = 255;
            }

            let on_horizontal = y.abs_diff(cy) <= 1 && x.abs_diff(cx) <= arm;
            let on_vertical = x.abs_diff(cx) <= 1 && y.abs_diff(cy) <= arm;
            if on_horizontal || on_vertical {
                value = 255;
            }

            let dx = x as f64 - hot_x;
            let dy = y as f64 - hot_y;
            let glow = (-(dx * dx + dy * dy) / two_sigma_sq).exp();
            value += (glow * 160.0) as i32;

            *px = value.clamp(0, 255) as u8;
        }
    }
}
