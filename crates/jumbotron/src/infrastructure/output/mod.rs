//! In-memory physical output.
//!
//! [`PixmapOutput`] is a display that exists only as a pixel buffer.  It
//! reports a fixed on-screen rectangle, an optional scale tag, and keeps
//! whatever the virtual surface pushes into it so callers can inspect or save
//! it.  It is also a [`DrawingSurface`] in its own right, which makes it the
//! "single physical surface" a virtual surface stands in for.
//!
//! Blits use nearest-neighbour sampling so scaled outputs show crisp, exact
//! copies of the buffer pixels.  They paint straight onto the backing pixmap,
//! so whatever state a client leaves on the output's own 2D context (alpha,
//! transform, clip, compositing) never leaks into a flush.

use jumbotron_core::{
    BlendMode, Canvas2d, Color, Pixmap, PixmapContext, Rectangle, Transform, CONTEXT_2D,
};
use tiny_skia::{FilterQuality, Paint, Pattern, Rect, SpreadMode};
use tracing::trace;

use crate::application::output::{OutputError, PhysicalOutput};
use crate::application::surface::{DrawingSurface, SurfaceError};

/// A physical output backed by a `tiny-skia` pixmap.
pub struct PixmapOutput {
    name: String,
    layout: Rectangle,
    scale_tag: Option<String>,
    context: PixmapContext,
    clears: u64,
    blits: u64,
}

impl PixmapOutput {
    /// Creates an output at `layout` with a transparent backing store of the
    /// layout's size.
    ///
    /// # Errors
    ///
    /// [`OutputError::Allocation`] if the layout has no area.
    pub fn new(name: impl Into<String>, layout: Rectangle) -> Result<Self, OutputError> {
        let context = PixmapContext::new(layout.width(), layout.height())
            .map_err(|_| OutputError::Allocation)?;
        Ok(Self {
            name: name.into(),
            layout,
            scale_tag: None,
            context,
            clears: 0,
            blits: 0,
        })
    }

    /// Sets the raw scale attribute reported to the virtual surface.
    pub fn with_scale_tag(mut self, tag: impl Into<String>) -> Self {
        self.scale_tag = Some(tag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Moves the output on screen, keeping its size and contents.
    pub fn relocate(&mut self, x: i32, y: i32) {
        self.layout = Rectangle::from_xywh(x, y, self.layout.width(), self.layout.height());
    }

    /// The output's pixels.
    pub fn pixmap(&self) -> &Pixmap {
        self.context.pixmap()
    }

    /// Non-premultiplied `[r, g, b, a]` at `(x, y)`, or `None` off the output.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.context.get_image_data(x as i32, y as i32, 1, 1).pixel(0, 0)
    }

    /// Number of times the output was cleared.
    pub fn clears(&self) -> u64 {
        self.clears
    }

    /// Number of blits received.
    pub fn blits(&self) -> u64 {
        self.blits
    }
}

impl PhysicalOutput for PixmapOutput {
    fn layout(&self) -> Rectangle {
        self.layout
    }

    fn scale_tag(&self) -> Option<String> {
        self.scale_tag.clone()
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.context.width(), self.context.height())
    }

    fn clear(&mut self) -> Result<(), OutputError> {
        self.context.pixmap_mut().fill(Color::TRANSPARENT);
        self.clears += 1;
        Ok(())
    }

    fn blit(&mut self, source: &Pixmap, source_rect: Rectangle) -> Result<(), OutputError> {
        self.blits += 1;

        let (source_width, source_height) = (source_rect.width(), source_rect.height());
        if source_width == 0 || source_height == 0 {
            return Ok(());
        }

        // Only the part of the crop that lies inside the buffer is drawn; the
        // rest of the output stays as cleared.
        let buffer = Rectangle::from_xywh(0, 0, source.width(), source.height());
        let visible = source_rect.intersection(&buffer);
        if visible.width() == 0 || visible.height() == 0 {
            return Ok(());
        }

        let (width, height) = self.dimensions();
        let kx = width as f32 / source_width as f32;
        let ky = height as f32 / source_height as f32;
        let dx = (i64::from(visible.start.x) - i64::from(source_rect.start.x)) as f32 * kx;
        let dy = (i64::from(visible.start.y) - i64::from(source_rect.start.y)) as f32 * ky;

        // Buffer pixel (sx, sy) lands at (dx + (sx - visible.x) * kx, ...).
        let shader = Pattern::new(
            source.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Nearest,
            1.0,
            Transform::from_row(
                kx,
                0.0,
                0.0,
                ky,
                dx - visible.start.x as f32 * kx,
                dy - visible.start.y as f32 * ky,
            ),
        );
        let paint = Paint {
            shader,
            blend_mode: BlendMode::SourceOver,
            anti_alias: false,
            ..Paint::default()
        };

        let target = Rect::from_xywh(
            dx,
            dy,
            visible.width() as f32 * kx,
            visible.height() as f32 * ky,
        );
        if let Some(target) = target {
            self.context
                .pixmap_mut()
                .fill_rect(target, &paint, Transform::identity(), None);
        }

        trace!(output = %self.name, ?source_rect, ?visible, "blit");
        Ok(())
    }
}

impl DrawingSurface for PixmapOutput {
    type Context = PixmapContext;

    fn width(&self) -> u32 {
        self.context.width()
    }

    fn height(&self) -> u32 {
        self.context.height()
    }

    fn get_context(&mut self, kind: &str) -> Result<&mut PixmapContext, SurfaceError> {
        if kind != CONTEXT_2D {
            return Err(SurfaceError::UnsupportedContext(kind.to_string()));
        }
        Ok(&mut self.context)
    }

    fn to_png(&self) -> Result<Vec<u8>, SurfaceError> {
        Ok(self.context.encode_png()?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
