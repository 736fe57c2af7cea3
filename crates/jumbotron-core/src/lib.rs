//! # jumbotron-core
//!
//! Shared library for Jumbotron containing the geometry types, the output
//! region snapshot, and the 2D drawing-context contract together with its
//! raster implementation.
//!
//! This crate has zero dependencies on windowing systems, async runtimes or
//! the file system.  The `jumbotron` crate builds the virtual surface, the
//! operation proxy and the update scheduler on top of it.
//!
//! # Architecture overview (for beginners)
//!
//! Jumbotron turns a wall of separate displays ("outputs") into one big
//! drawing surface.  A client draws into a single off-screen buffer as if it
//! were one canvas, and the engine copies the right slice of that buffer onto
//! every display.
//!
//! This crate (`jumbotron-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure geometry.  `Point` and `Rectangle` describe where
//!   things are in the shared coordinate space; `OutputRegion` remembers where
//!   one physical display sits and how much of the buffer it shows.
//!
//! - **`canvas`** – The `Canvas2d` trait: an explicit list of every 2D drawing
//!   operation and property the engine knows how to intercept, plus
//!   `PixmapContext`, the real raster implementation backed by `tiny-skia`.

pub mod canvas;
pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `jumbotron_core::Rectangle` instead of `jumbotron_core::domain::geometry::Rectangle`.
pub use canvas::{
    pixmap::PixmapContext, Canvas2d, CanvasError, ColorStop, ImageData, PaintStyle, CONTEXT_2D,
};
pub use domain::geometry::{bounding_rect, get_intersecting_rects, Point, Rectangle};
pub use domain::output_region::{parse_scale, OutputRegion, RegionError};

/// Raster types re-exported from `tiny-skia` so downstream crates do not
/// need a direct dependency to name colours, blend modes or pixmaps.
pub use tiny_skia::{BlendMode, Color, FillRule, LineCap, LineJoin, Pixmap, Transform};
