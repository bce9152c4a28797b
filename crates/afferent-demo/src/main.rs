//! Particle field driven through the zero-copy FloatBuffer path.
//!
//! Usage: `afferent-demo [FONT_PATH]`. With a font, an FPS overlay is drawn.

use afferent::logging::{LoggingConfig, init_logging};
use afferent::render::layout::{DYNAMIC_CIRCLE_FLOATS, INSTANCE_FLOATS};
use afferent::time::FrameClock;
use afferent::{FloatBuffer, Font, NativeWindow, Renderer, RendererConfig, WindowConfig};
use anyhow::Context;
use rand::Rng;

const PARTICLES: usize = 4000;
const BARS: usize = 24;

struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    hue: f32,
    radius: f32,
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let mut window = NativeWindow::new(WindowConfig {
        title: "afferent particles".into(),
        ..WindowConfig::default()
    })?;
    let mut renderer = Renderer::new(&window, RendererConfig::default())?;

    let mut font = match std::env::args().nth(1) {
        Some(path) => Some(Font::load(&path, 18).with_context(|| format!("loading {path}"))?),
        None => None,
    };

    let mut rng = rand::rng();
    let (w, h) = renderer.screen_size();
    let (w, h) = (w.max(1.0), h.max(1.0));
    let mut particles: Vec<Particle> = (0..PARTICLES)
        .map(|_| Particle {
            x: rng.random_range(0.0..w),
            y: rng.random_range(0.0..h),
            vx: rng.random_range(-120.0..120.0),
            vy: rng.random_range(-120.0..120.0),
            hue: rng.random_range(0.0..1.0),
            radius: rng.random_range(2.0..6.0),
        })
        .collect();

    let mut circles = FloatBuffer::new(PARTICLES * DYNAMIC_CIRCLE_FLOATS)?;
    let mut bars = FloatBuffer::new(BARS * INSTANCE_FLOATS)?;

    let mut clock = FrameClock::new();
    let mut fps = 0.0f32;

    while !window.should_close() {
        window.poll_events();
        let ft = clock.tick();
        fps = fps * 0.95 + (1.0 / ft.dt) * 0.05;

        let (w, h) = renderer.screen_size();
        let records = circles.as_mut_slice().chunks_exact_mut(DYNAMIC_CIRCLE_FLOATS);
        for (p, record) in particles.iter_mut().zip(records) {
            p.x += p.vx * ft.dt;
            p.y += p.vy * ft.dt;
            if p.x < 0.0 || p.x > w {
                p.vx = -p.vx;
                p.x = p.x.clamp(0.0, w);
            }
            if p.y < 0.0 || p.y > h {
                p.vy = -p.vy;
                p.y = p.y.clamp(0.0, h);
            }
            record.copy_from_slice(&[p.x, p.y, p.hue, p.radius]);
        }

        for i in 0..BARS {
            let t = i as f32 / BARS as f32;
            let x = -0.95 + t * 1.9;
            let y = -0.85 + 0.05 * (ft.elapsed * 2.0 + t * 6.0).sin();
            bars.set_vec(
                i * INSTANCE_FLOATS,
                [x, y, ft.elapsed * (0.5 + t), 0.03, t, 0.4, 1.0 - t, 0.9],
            );
        }

        if let Err(e) = renderer.begin_frame([0.02, 0.02, 0.05, 1.0]) {
            log::debug!("skipping frame: {e}");
            clock.reset();
            continue;
        }

        renderer.draw_dynamic_circles_buffer(&circles, PARTICLES as u32, ft.elapsed, 0.1);
        renderer.draw_instanced_rects_buffer(&bars, BARS as u32);

        if let Some(font) = font.as_mut() {
            let label = format!("{PARTICLES} particles  {fps:.0} fps");
            renderer.draw_text(font, &label, 16.0, 32.0, [1.0, 1.0, 1.0, 0.9], None)?;
        }

        renderer.end_frame()?;

        if ft.frame_index % 600 == 0 {
            log::info!("frame {} pool {:?}", ft.frame_index, renderer.pool_stats());
        }
    }

    Ok(())
}
