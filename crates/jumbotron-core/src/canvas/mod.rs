//! The 2D drawing-context contract.
//!
//! [`Canvas2d`] enumerates every operation and property of a 2D raster
//! context that the engine knows about.  Anything that draws into a surface
//! (the real [`pixmap::PixmapContext`], or the intercepting proxy built on top
//! of it in the `jumbotron` crate) implements this one trait.
//!
//! # Reads versus mutations
//!
//! The receiver type carries meaning:
//!
//! - Methods taking `&self` are *reads*: property getters, `get_transform`,
//!   `get_image_data`, `is_point_in_path`.  They never change the context.
//! - Methods taking `&mut self` are *mutations*: property setters, state and
//!   path edits, and everything that touches pixels.
//!
//! The proxy relies on this split to decide which calls schedule a
//! redistribution of the buffer.

use thiserror::Error;
use tiny_skia::{BlendMode, Color, FillRule, LineCap, LineJoin, Pixmap, Transform};

/// Raster implementation backed by `tiny-skia`.
pub mod pixmap;

/// The only context kind a surface hands out.
pub const CONTEXT_2D: &str = "2d";

/// Errors raised by a raster context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    /// A pixel buffer cannot be allocated with the requested size.
    #[error("cannot allocate a {width}x{height} pixel buffer")]
    InvalidDimensions { width: u32, height: u32 },

    /// Encoding the buffer into an image format failed.
    #[error("image encoding failed: {0}")]
    Encode(String),

    /// An RGBA block does not hold exactly `width * height * 4` bytes.
    #[error("image data holds {actual} bytes, expected {expected}")]
    ImageDataLength { expected: usize, actual: usize },
}

/// A block of non-premultiplied RGBA pixels, row-major, 4 bytes per pixel.
///
/// The byte buffer always holds exactly `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageData {
    /// Creates a fully transparent block.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wraps existing RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ImageDataLength`] unless `data` holds exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CanvasError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(CanvasError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(CanvasError::ImageDataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable RGBA bytes.  The length is fixed.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the `[r, g, b, a]` value at `(x, y)`, or `None` outside the block.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }
}

/// One color stop of a gradient.  `offset` runs from `0.0` (start) to `1.0` (end).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

impl ColorStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// What a fill or a stroke paints with.
///
/// Gradient geometry is in user space and is resolved against the transform
/// that is current when the fill or stroke happens.  Stops are applied in
/// offset order; a gradient without stops paints nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintStyle {
    Solid(Color),
    /// Colors run along the line from `(x0, y0)` to `(x1, y1)`.
    LinearGradient {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        stops: Vec<ColorStop>,
    },
    /// Colors run from the focal point `(fx, fy)` out to the circle of
    /// `radius` around `(cx, cy)`.
    RadialGradient {
        fx: f32,
        fy: f32,
        cx: f32,
        cy: f32,
        radius: f32,
        stops: Vec<ColorStop>,
    },
}

impl PaintStyle {
    /// `false` for non-finite geometry, a negative radius or a stop offset
    /// outside `0.0..=1.0`.  Setters ignore invalid styles.
    pub fn is_valid(&self) -> bool {
        fn stops_valid(stops: &[ColorStop]) -> bool {
            stops.iter().all(|s| (0.0..=1.0).contains(&s.offset))
        }
        match self {
            Self::Solid(_) => true,
            Self::LinearGradient { x0, y0, x1, y1, stops } => {
                [x0, y0, x1, y1].iter().all(|v| v.is_finite()) && stops_valid(stops)
            }
            Self::RadialGradient { fx, fy, cx, cy, radius, stops } => {
                [fx, fy, cx, cy].iter().all(|v| v.is_finite())
                    && radius.is_finite()
                    && *radius >= 0.0
                    && stops_valid(stops)
            }
        }
    }
}

impl From<Color> for PaintStyle {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

/// Every operation and property of a 2D drawing context.
///
/// Angles are in radians.  Coordinates are in user space and pass through the
/// current transform unless stated otherwise.
pub trait Canvas2d {
    // ── Properties ────────────────────────────────────────────────────────────

    fn fill_style(&self) -> PaintStyle;
    fn set_fill_style(&mut self, style: PaintStyle);

    fn stroke_style(&self) -> PaintStyle;
    fn set_stroke_style(&mut self, style: PaintStyle);

    fn line_width(&self) -> f32;
    fn set_line_width(&mut self, width: f32);

    fn line_cap(&self) -> LineCap;
    fn set_line_cap(&mut self, cap: LineCap);

    fn line_join(&self) -> LineJoin;
    fn set_line_join(&mut self, join: LineJoin);

    fn miter_limit(&self) -> f32;
    fn set_miter_limit(&mut self, limit: f32);

    fn line_dash(&self) -> Vec<f32>;
    fn set_line_dash(&mut self, segments: Vec<f32>);

    fn line_dash_offset(&self) -> f32;
    fn set_line_dash_offset(&mut self, offset: f32);

    fn global_alpha(&self) -> f32;
    fn set_global_alpha(&mut self, alpha: f32);

    fn global_composite_operation(&self) -> BlendMode;
    fn set_global_composite_operation(&mut self, mode: BlendMode);

    fn image_smoothing_enabled(&self) -> bool;
    fn set_image_smoothing_enabled(&mut self, enabled: bool);

    // ── State stack ───────────────────────────────────────────────────────────

    /// Pushes the drawing state (styles, transform, clip) onto the stack.
    fn save(&mut self);
    /// Pops the drawing state; a no-op on an empty stack.
    fn restore(&mut self);

    // ── Transform ─────────────────────────────────────────────────────────────

    fn scale(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);
    fn translate(&mut self, x: f32, y: f32);
    /// Multiplies the current transform by the matrix `[a c e; b d f]`.
    fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32);
    /// Replaces the current transform with the matrix `[a c e; b d f]`.
    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32);
    fn reset_transform(&mut self);
    fn get_transform(&self) -> Transform;

    // ── Path ──────────────────────────────────────────────────────────────────

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32);
    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32);
    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32, counterclockwise: bool);
    /// Rounds the corner at `(x1, y1)` between the current point and `(x2, y2)`.
    fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32);
    /// Elliptical arc; `rotation` turns the ellipse's axes around its centre.
    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &mut self,
        x: f32,
        y: f32,
        radius_x: f32,
        radius_y: f32,
        rotation: f32,
        start_angle: f32,
        end_angle: f32,
        counterclockwise: bool,
    );
    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn fill(&mut self, rule: FillRule);
    fn stroke(&mut self);
    /// Intersects the clip region with the current path.
    fn clip(&mut self, rule: FillRule);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    /// Sets every pixel of the rectangle to transparent black.
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    // ── Images ────────────────────────────────────────────────────────────────

    fn draw_image(&mut self, image: &Pixmap, dx: f32, dy: f32);
    fn draw_image_scaled(&mut self, image: &Pixmap, dx: f32, dy: f32, dw: f32, dh: f32);
    #[allow(clippy::too_many_arguments)]
    fn draw_image_cropped(
        &mut self,
        image: &Pixmap,
        sx: f32,
        sy: f32,
        sw: f32,
        sh: f32,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    );

    // ── Pixel data ────────────────────────────────────────────────────────────

    fn create_image_data(&self, width: u32, height: u32) -> ImageData;
    /// Reads a block of device pixels; pixels outside the buffer read as transparent.
    fn get_image_data(&self, sx: i32, sy: i32, width: u32, height: u32) -> ImageData;
    /// Writes a block of device pixels, ignoring transform, clip and alpha.
    fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32);

    // ── Hit testing ───────────────────────────────────────────────────────────

    /// Returns `true` if the device-space point lies inside the current path.
    fn is_point_in_path(&self, x: f32, y: f32, rule: FillRule) -> bool;
}
