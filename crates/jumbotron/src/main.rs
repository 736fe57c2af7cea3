//! Jumbotron demo entry point.
//!
//! Builds an in-memory output wall from a TOML file, draws an animated scene
//! across the whole wall through one virtual surface, and exports the result.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config(path)         -- wall layout + frame-loop settings
//!  └─ PixmapOutput per entry    -- the "physical" outputs
//!  └─ VirtualSurface::new()     -- union geometry, shared buffer, proxy
//!  └─ run_frames()              -- tokio interval: flush, then draw
//!  └─ export                    -- <output_dir>/<name>.png + wall.png
//! ```
//!
//! Usage: `jumbotron [CONFIG]` (default `jumbotron.toml`).  A missing config
//! file runs the built-in two-output wall.  Ctrl-C stops the animation early
//! and still exports the last flushed frame.

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jumbotron::application::frame_loop::{run_frames, FrameLoopConfig};
use jumbotron::infrastructure::output::PixmapOutput;
use jumbotron::infrastructure::storage::config::{load_config, OutputEntry, WallConfig};
use jumbotron::{DrawingSurface, SharedOutput, VirtualSurface};
use jumbotron_core::{Canvas2d, Color, ColorStop, FillRule, PaintStyle};

const DEFAULT_CONFIG_PATH: &str = "jumbotron.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = load_config(&config_path)
        .with_context(|| format!("loading wall config from {}", config_path.display()))?;

    // Initialise structured logging.  `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.wall.log_level)),
        )
        .init();

    info!(config = %config_path.display(), outputs = config.outputs.len(), "jumbotron starting");

    let outputs = build_outputs(&config.outputs)?;
    let shared: Vec<SharedOutput> = outputs
        .iter()
        .map(|output| Rc::clone(output) as SharedOutput)
        .collect();
    let mut surface = VirtualSurface::new(&shared).context("assembling virtual surface")?;

    let (width, height) = (surface.width() as f32, surface.height() as f32);
    let frame_config = FrameLoopConfig::from_millis(config.wall.tick_interval_ms, config.wall.frames);
    let total = frame_config.frames.max(1) as f32;

    tokio::select! {
        result = run_frames(&mut surface, frame_config, |ctx, frame| {
            draw_scene(ctx, frame as f32 / total, width, height);
        }) => {
            let stats = result.context("running frame loop")?;
            info!(frames = stats.frames, flushes = stats.flushes, "animation complete");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; exporting the last flushed frame");
        }
    }

    export(&config, &surface, &outputs)?;
    info!("jumbotron stopped");
    Ok(())
}

/// Creates one in-memory output per config entry.
fn build_outputs(entries: &[OutputEntry]) -> anyhow::Result<Vec<Rc<RefCell<PixmapOutput>>>> {
    entries
        .iter()
        .map(|entry| {
            let mut output = PixmapOutput::new(entry.name.clone(), entry.layout())
                .with_context(|| format!("creating output {:?}", entry.name))?;
            if let Some(tag) = entry.scale_tag() {
                output = output.with_scale_tag(tag);
            }
            Ok(Rc::new(RefCell::new(output)))
        })
        .collect()
}

/// Draws one frame: a graded backdrop, a ball sweeping across the whole wall
/// with its shadow, and a rounded frame around the outer edge.  `t` runs from
/// 0 to 1 over the animation.
fn draw_scene<C: Canvas2d>(ctx: &mut C, t: f32, width: f32, height: f32) {
    ctx.set_fill_style(PaintStyle::LinearGradient {
        x0: 0.0,
        y0: 0.0,
        x1: 0.0,
        y1: height,
        stops: vec![
            ColorStop::new(0.0, Color::from_rgba8(16, 24, 48, 255)),
            ColorStop::new(1.0, Color::from_rgba8(48, 16, 64, 255)),
        ],
    });
    ctx.fill_rect(0.0, 0.0, width, height);

    let radius = height * 0.3;
    let x = radius + (width - 2.0 * radius) * t;
    let y = height * 0.5 + (t * TAU).sin() * height * 0.15;
    ctx.set_fill_style(Color::from_rgba8(0, 0, 0, 96).into());
    ctx.begin_path();
    ctx.ellipse(x, height * 0.92, radius, radius * 0.15, 0.0, 0.0, TAU, false);
    ctx.fill(FillRule::Winding);

    ctx.set_fill_style(PaintStyle::RadialGradient {
        fx: x - radius * 0.3,
        fy: y - radius * 0.3,
        cx: x,
        cy: y,
        radius,
        stops: vec![
            ColorStop::new(0.0, Color::from_rgba8(255, 240, 160, 255)),
            ColorStop::new(1.0, Color::from_rgba8(250, 190, 40, 255)),
        ],
    });
    ctx.begin_path();
    ctx.arc(x, y, radius, 0.0, TAU, false);
    ctx.fill(FillRule::Winding);

    let corner = height * 0.05;
    let (left, top, right, bottom) = (2.0, 2.0, width - 2.0, height - 2.0);
    ctx.set_stroke_style(Color::from_rgba8(255, 255, 255, 255).into());
    ctx.set_line_width(4.0);
    ctx.set_line_dash(vec![24.0, 8.0]);
    ctx.set_line_dash_offset(t * 32.0);
    ctx.begin_path();
    ctx.move_to(left + corner, top);
    ctx.arc_to(right, top, right, bottom, corner);
    ctx.arc_to(right, bottom, left, bottom, corner);
    ctx.arc_to(left, bottom, left, top, corner);
    ctx.arc_to(left, top, right, top, corner);
    ctx.close_path();
    ctx.stroke();
}

/// Writes every output and the composite buffer as PNG files.
fn export(
    config: &WallConfig,
    surface: &VirtualSurface,
    outputs: &[Rc<RefCell<PixmapOutput>>],
) -> anyhow::Result<()> {
    let dir = &config.wall.output_dir;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    for output in outputs {
        let output = output.borrow();
        write_png(&dir.join(format!("{}.png", output.name())), &output.to_png()?)?;
    }
    write_png(&dir.join("wall.png"), &surface.to_png()?)?;

    info!(dir = %dir.display(), files = outputs.len() + 1, "exported PNG files");
    Ok(())
}

fn write_png(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
