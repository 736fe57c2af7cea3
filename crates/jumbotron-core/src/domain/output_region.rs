//! Output region: where one physical output sits in the shared coordinate space.
//!
//! An [`OutputRegion`] is a *snapshot*.  The output's on-screen rectangle is
//! read once when the region is built and never re-queried; if a display is
//! moved afterwards the virtual surface must be rebuilt.
//!
//! # Scale tags (for beginners)
//!
//! A display may be tagged with an integer scale factor.  A 200×200 display
//! tagged `"2"` claims only 100×100 pixels of the virtual surface: the
//! engine reads a 100×100 crop from the buffer and stretches it over all
//! 200×200 physical pixels.  The *logical* rectangle (used to size the
//! buffer) therefore keeps the physical top-left corner but shrinks its size
//! by the scale factor.

use thiserror::Error;
use tracing::debug;

use super::geometry::{Point, Rectangle};

/// Errors raised while capturing an output's placement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    /// The scale tag is present but is not a positive integer.
    #[error("invalid scale tag {tag:?}: expected a positive integer")]
    InvalidScale { tag: String },

    /// The output reported a layout rectangle whose start lies beyond its end.
    #[error("output layout is inverted: {layout:?}")]
    InvertedLayout { layout: Rectangle },
}

/// Parses an output scale tag.
///
/// Surrounding whitespace is ignored.  An empty tag means "no scale" and
/// yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`RegionError::InvalidScale`] for anything that is not a positive
/// integer (`"0"`, `"-2"`, `"1.5"`, `"2x"`, ...).
pub fn parse_scale(tag: &str) -> Result<Option<u32>, RegionError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<u32>() {
        Ok(scale) if scale > 0 => Ok(Some(scale)),
        _ => Err(RegionError::InvalidScale {
            tag: tag.to_string(),
        }),
    }
}

/// Divides a length by the scale factor, rounding to the nearest pixel.
fn scaled_len(len: u32, scale: u32) -> u32 {
    (f64::from(len) / f64::from(scale)).round() as u32
}

/// One physical output as seen by the virtual surface.
///
/// `H` is the handle to the output itself.  The region never owns the
/// output: the virtual surface stores a weak reference here, and tests may
/// use any marker type.
#[derive(Debug, Clone)]
pub struct OutputRegion<H> {
    /// Rectangle claimed in the virtual surface (scaled down when tagged).
    logical: Rectangle,
    /// Rectangle the output actually occupies on screen.
    physical: Rectangle,
    /// Parsed scale tag, if any.
    scale: Option<u32>,
    output: H,
}

impl<H> OutputRegion<H> {
    /// Captures an output's placement.
    ///
    /// `layout` is the output's on-screen rectangle and `scale_tag` its raw
    /// scale attribute, both read once by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvertedLayout`] for a degenerate layout and
    /// [`RegionError::InvalidScale`] for a malformed scale tag.
    pub fn new(layout: Rectangle, scale_tag: Option<&str>, output: H) -> Result<Self, RegionError> {
        if layout.is_empty() {
            return Err(RegionError::InvertedLayout { layout });
        }

        let scale = match scale_tag {
            Some(tag) => parse_scale(tag)?,
            None => None,
        };

        let logical = match scale {
            Some(s) => Rectangle::from_xywh(
                layout.start.x,
                layout.start.y,
                scaled_len(layout.width(), s),
                scaled_len(layout.height(), s),
            ),
            None => layout,
        };

        debug!(?layout, ?logical, ?scale, "captured output region");

        Ok(Self {
            logical,
            physical: layout,
            scale,
            output,
        })
    }

    /// Rectangle this output claims in the virtual surface.
    pub fn logical(&self) -> &Rectangle {
        &self.logical
    }

    /// Rectangle the output occupies on screen.
    pub fn physical(&self) -> &Rectangle {
        &self.physical
    }

    /// Scale factor, if the output was tagged with one.
    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    /// Handle to the physical output.
    pub fn output(&self) -> &H {
        &self.output
    }

    /// Position of this region inside a buffer whose top-left corner is `origin`.
    pub fn offset_from(&self, origin: Point) -> Point {
        self.logical.start - origin
    }

    /// Size of the buffer crop shown on an output whose backing store is
    /// `width × height` pixels.
    pub fn source_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self.scale {
            Some(s) => (scaled_len(width, s), scaled_len(height, s)),
            None => (width, height),
        }
    }
}

impl<H> AsRef<Rectangle> for OutputRegion<H> {
    fn as_ref(&self) -> &Rectangle {
        &self.logical
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
