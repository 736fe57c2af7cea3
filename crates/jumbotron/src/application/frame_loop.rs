//! Frame loop: the tick source that drives flushes.
//!
//! Each frame waits for the next interval tick, flushes whatever was drawn
//! since the previous tick, and then hands the 2D context to the caller to
//! draw the next frame.  After the last frame one extra tick flushes the final
//! drawing, so every frame reaches the outputs.
//!
//! The surface holds `Rc` handles and is not `Send`; run the loop on a
//! current-thread runtime (or inside a `LocalSet`).

use std::time::Duration;

use jumbotron_core::{PixmapContext, CONTEXT_2D};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::proxy::OperationProxy;
use super::surface::{DrawingSurface, SurfaceError, VirtualSurface};

/// Default tick period, roughly one display refresh at 60 Hz.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Settings for [`run_frames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLoopConfig {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Number of frames the caller draws.
    pub frames: u64,
}

impl FrameLoopConfig {
    /// Builds a config from a millisecond period.  `0` is raised to 1 ms so
    /// the loop still yields between ticks.
    pub fn from_millis(tick_interval_ms: u64, frames: u64) -> Self {
        Self {
            tick_interval: Duration::from_millis(tick_interval_ms.max(1)),
            frames,
        }
    }
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            frames: 60,
        }
    }
}

/// Counters returned by [`run_frames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frames drawn by the caller.
    pub frames: u64,
    /// Ticks that actually redistributed the buffer.
    pub flushes: u64,
}

/// Runs `config.frames` frames against `surface`.
///
/// `draw` receives the 2D context and the zero-based frame number.
///
/// # Errors
///
/// Stops at the first flush failure and returns it.
pub async fn run_frames<F>(
    surface: &mut VirtualSurface,
    config: FrameLoopConfig,
    mut draw: F,
) -> Result<FrameStats, SurfaceError>
where
    F: FnMut(&mut OperationProxy<PixmapContext>, u64),
{
    let mut ticker = interval(config.tick_interval);
    // A slow frame pushes later ticks back instead of bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut stats = FrameStats::default();

    for frame in 0..config.frames {
        ticker.tick().await;
        if surface.tick()? {
            stats.flushes += 1;
        }

        let ctx = surface.get_context(CONTEXT_2D)?;
        draw(ctx, frame);
        stats.frames += 1;
        debug!(frame, "frame drawn");
    }

    ticker.tick().await;
    if surface.tick()? {
        stats.flushes += 1;
    }

    info!(frames = stats.frames, flushes = stats.flushes, "frame loop finished");
    Ok(stats)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
