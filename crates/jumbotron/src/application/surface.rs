//! VirtualSurface: one drawing surface covering every output on the wall.
//!
//! # Lifecycle
//!
//! 1. **Attach** – [`VirtualSurface::new`] reads each output's layout and scale
//!    tag exactly once, folds the logical rectangles into a bounding box and
//!    allocates a buffer of that size.
//! 2. **Draw** – clients call [`DrawingSurface::get_context`] with `"2d"` and
//!    draw through the returned [`OperationProxy`].  Every mutation lands in
//!    the buffer immediately and marks a flush as pending.
//! 3. **Flush** – the tick source calls [`VirtualSurface::tick`].  If a flush
//!    is pending, every output is cleared and then receives its slice of the
//!    buffer, stretched when the output is scaled.
//!
//! # Coordinates
//!
//! The buffer's pixel `(0, 0)` corresponds to the bounding box's top-left
//! corner.  An output whose logical rectangle starts at `(x, y)` therefore
//! shows the buffer from `(x - bounds.start.x, y - bounds.start.y)` onwards.
//!
//! The surface only keeps weak references to outputs.  The geometry captured
//! at attach time is never refreshed; rebuild the surface after moving an
//! output.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jumbotron_core::{
    bounding_rect, get_intersecting_rects, Canvas2d, CanvasError, OutputRegion, PixmapContext,
    Rectangle, RegionError, CONTEXT_2D,
};
use thiserror::Error;
use tracing::{debug, info};

use super::output::{OutputError, PhysicalOutput, SharedOutput};
use super::proxy::OperationProxy;

/// Prefix of every URL returned by [`DrawingSurface::to_data_url`].
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Weak handle the surface keeps for each output.
pub type WeakOutput = Weak<RefCell<dyn PhysicalOutput>>;

/// Errors raised while building or flushing a virtual surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("a virtual surface needs at least one output")]
    NoOutputs,

    #[error("output {index} cannot be attached: {source}")]
    Region {
        index: usize,
        #[source]
        source: RegionError,
    },

    #[error("unsupported context kind {0:?}")]
    UnsupportedContext(String),

    #[error("buffer error: {0}")]
    Buffer(#[from] CanvasError),

    #[error("output {index} was released by its owner")]
    OutputReleased { index: usize },

    #[error("output {index} is borrowed elsewhere")]
    OutputBusy { index: usize },

    #[error("output {index} failed to update: {source}")]
    Output {
        index: usize,
        #[source]
        source: OutputError,
    },
}

/// What a client can do with any drawing surface, virtual or physical.
pub trait DrawingSurface {
    /// Context type handed out for `"2d"`.
    type Context: Canvas2d;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Returns the 2D context.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::UnsupportedContext`] for any kind other than `"2d"`.
    fn get_context(&mut self, kind: &str) -> Result<&mut Self::Context, SurfaceError>;

    /// Encodes the surface's current pixels as PNG.
    fn to_png(&self) -> Result<Vec<u8>, SurfaceError>;

    /// The PNG encoding as a `data:` URL.
    fn to_data_url(&self) -> Result<String, SurfaceError> {
        let png = self.to_png()?;
        Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
    }
}

/// A drawing surface spanning several physical outputs.
pub struct VirtualSurface {
    bounds: Rectangle,
    regions: Vec<OutputRegion<WeakOutput>>,
    context: OperationProxy<PixmapContext>,
}

impl VirtualSurface {
    /// Attaches `outputs` and allocates the shared buffer.
    ///
    /// # Errors
    ///
    /// - [`SurfaceError::NoOutputs`] for an empty slice.
    /// - [`SurfaceError::OutputBusy`] if an output is mutably borrowed.
    /// - [`SurfaceError::Region`] for an inverted layout or a bad scale tag.
    /// - [`SurfaceError::Buffer`] if the bounding box has no area.
    pub fn new(outputs: &[SharedOutput]) -> Result<Self, SurfaceError> {
        if outputs.is_empty() {
            return Err(SurfaceError::NoOutputs);
        }

        let regions = outputs
            .iter()
            .enumerate()
            .map(|(index, output)| attach(index, output))
            .collect::<Result<Vec<_>, _>>()?;

        let bounds = bounding_rect(regions.iter().map(|r| r.logical()));
        let buffer = PixmapContext::new(bounds.width(), bounds.height())?;

        info!(
            outputs = regions.len(),
            ?bounds,
            width = bounds.width(),
            height = bounds.height(),
            "virtual surface assembled"
        );

        Ok(Self {
            bounds,
            regions,
            context: OperationProxy::new(buffer),
        })
    }

    /// Bounding box of every output's logical rectangle.
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// The captured output regions, in attach order.
    pub fn regions(&self) -> &[OutputRegion<WeakOutput>] {
        &self.regions
    }

    /// The shared buffer.  Reading it never schedules a flush.
    pub fn buffer(&self) -> &PixmapContext {
        self.context.inner()
    }

    pub fn is_update_pending(&self) -> bool {
        self.context.scheduler().is_pending()
    }

    /// Number of flushes run so far.
    pub fn flushes(&self) -> u64 {
        self.context.scheduler().flushes()
    }

    /// Runs the pending flush, if any.  Returns whether one ran.
    ///
    /// # Errors
    ///
    /// The first output failure stops the flush and is returned as is.
    /// Outputs earlier in the list keep their new contents.
    pub fn tick(&mut self) -> Result<bool, SurfaceError> {
        if !self.context.scheduler_mut().begin_flush() {
            return Ok(false);
        }
        self.update()?;
        Ok(true)
    }

    /// Outputs whose logical rectangle touches `rect` (buffer-space
    /// coordinates are translated back to the shared space first).
    pub fn regions_intersecting(&self, rect: &Rectangle) -> Vec<&OutputRegion<WeakOutput>> {
        let origin = self.bounds.start;
        let shared = Rectangle::new(rect.start + origin, rect.end + origin);
        get_intersecting_rects(&shared, &self.regions)
    }

    fn update(&self) -> Result<(), SurfaceError> {
        let buffer = self.context.inner().pixmap();

        for (index, region) in self.regions.iter().enumerate() {
            let handle = region
                .output()
                .upgrade()
                .ok_or(SurfaceError::OutputReleased { index })?;
            let mut output = handle
                .try_borrow_mut()
                .map_err(|_| SurfaceError::OutputBusy { index })?;

            let offset = region.offset_from(self.bounds.start);
            let (width, height) = output.dimensions();
            let (source_width, source_height) = region.source_size(width, height);
            let source_rect = Rectangle::from_xywh(offset.x, offset.y, source_width, source_height);

            output
                .clear()
                .map_err(|source| SurfaceError::Output { index, source })?;
            output
                .blit(buffer, source_rect)
                .map_err(|source| SurfaceError::Output { index, source })?;

            debug!(index, ?source_rect, width, height, "output updated");
        }

        debug!(outputs = self.regions.len(), "flush complete");
        Ok(())
    }
}

/// Captures one output's placement, reading its layout and tag once.
fn attach(index: usize, output: &SharedOutput) -> Result<OutputRegion<WeakOutput>, SurfaceError> {
    let (layout, tag) = {
        let output = output
            .try_borrow()
            .map_err(|_| SurfaceError::OutputBusy { index })?;
        (output.layout(), output.scale_tag())
    };
    OutputRegion::new(layout, tag.as_deref(), Rc::downgrade(output))
        .map_err(|source| SurfaceError::Region { index, source })
}

impl DrawingSurface for VirtualSurface {
    type Context = OperationProxy<PixmapContext>;

    fn width(&self) -> u32 {
        self.context.inner().width()
    }

    fn height(&self) -> u32 {
        self.context.inner().height()
    }

    fn get_context(&mut self, kind: &str) -> Result<&mut Self::Context, SurfaceError> {
        if kind != CONTEXT_2D {
            return Err(SurfaceError::UnsupportedContext(kind.to_string()));
        }
        Ok(&mut self.context)
    }

    fn to_png(&self) -> Result<Vec<u8>, SurfaceError> {
        Ok(self.context.inner().encode_png()?)
    }
}

impl std::fmt::Debug for VirtualSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualSurface")
            .field("bounds", &self.bounds)
            .field("outputs", &self.regions.len())
            .field("pending", &self.is_update_pending())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::output::MockPhysicalOutput;
    use jumbotron_core::{Color, Point};
    use mockall::Sequence;

    /// A mock that answers the attach-time queries.  Callers add the
    /// `clear`/`blit` expectations they care about.
    fn mock_output(layout: Rectangle, tag: Option<&'static str>) -> MockPhysicalOutput {
        let mut mock = MockPhysicalOutput::new();
        mock.expect_layout().times(1).return_const(layout);
        mock.expect_scale_tag()
            .times(1)
            .returning(move || tag.map(str::to_string));
        mock.expect_dimensions()
            .return_const((layout.width(), layout.height()));
        mock
    }

    fn share(mock: MockPhysicalOutput) -> SharedOutput {
        Rc::new(RefCell::new(mock))
    }

    fn side_by_side() -> (Rectangle, Rectangle) {
        (
            Rectangle::from_xywh(0, 0, 100, 100),
            Rectangle::from_xywh(100, 0, 100, 100),
        )
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn test_new_with_no_outputs_fails_fast() {
        let result = VirtualSurface::new(&[]);
        assert!(matches!(result, Err(SurfaceError::NoOutputs)));
    }

    #[test]
    fn test_new_sizes_buffer_to_union_of_outputs() {
        // Arrange
        let (a, b) = side_by_side();
        let outputs = [share(mock_output(a, None)), share(mock_output(b, None))];

        // Act
        let surface = VirtualSurface::new(&outputs).expect("two valid outputs");

        // Assert
        assert_eq!(
            surface.bounds(),
            Rectangle::new(Point::new(0, 0), Point::new(200, 100))
        );
        assert_eq!((surface.width(), surface.height()), (200, 100));
        assert_eq!(surface.regions().len(), 2);
        assert!(!surface.is_update_pending());
    }

    #[test]
    fn test_new_uses_logical_size_of_scaled_output() {
        let layout = Rectangle::from_xywh(0, 0, 200, 200);
        let outputs = [share(mock_output(layout, Some("2")))];

        let surface = VirtualSurface::new(&outputs).expect("valid scaled output");

        assert_eq!((surface.width(), surface.height()), (100, 100));
    }

    #[test]
    fn test_new_reports_index_of_bad_scale_tag() {
        // Arrange
        let (a, b) = side_by_side();
        let outputs = [share(mock_output(a, None)), share(mock_output(b, Some("two")))];

        // Act
        let result = VirtualSurface::new(&outputs);

        // Assert
        match result {
            Err(SurfaceError::Region { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(source, RegionError::InvalidScale { tag: "two".into() });
            }
            other => panic!("expected a region error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_union_too_wide_to_allocate() {
        // Arrange: two tiny outputs at opposite ends of the coordinate space
        let far_left = Rectangle::from_xywh(-2_000_000_000, 0, 4, 4);
        let far_right = Rectangle::from_xywh(2_000_000_000, 0, 4, 4);
        let outputs = [share(mock_output(far_left, None)), share(mock_output(far_right, None))];

        // Act
        let result = VirtualSurface::new(&outputs);

        // Assert
        assert!(matches!(
            result,
            Err(SurfaceError::Buffer(CanvasError::InvalidDimensions {
                width: 4_000_000_004,
                height: 4
            }))
        ));
    }

    #[test]
    fn test_new_treats_empty_scale_tag_as_unscaled() {
        let layout = Rectangle::from_xywh(0, 0, 50, 40);
        let outputs = [share(mock_output(layout, Some("")))];

        let surface = VirtualSurface::new(&outputs).expect("empty tag is accepted");

        assert_eq!(surface.regions()[0].scale(), None);
        assert_eq!((surface.width(), surface.height()), (50, 40));
    }

    // ── get_context ───────────────────────────────────────────────────────────

    #[test]
    fn test_get_context_rejects_unknown_kind() {
        let (a, _) = side_by_side();
        let outputs = [share(mock_output(a, None))];
        let mut surface = VirtualSurface::new(&outputs).expect("valid output");

        let result = surface.get_context("webgl");

        assert!(matches!(result, Err(SurfaceError::UnsupportedContext(kind)) if kind == "webgl"));
        assert!(!surface.is_update_pending());
    }

    #[test]
    fn test_drawing_through_context_marks_update_pending() {
        let (a, _) = side_by_side();
        let outputs = [share(mock_output(a, None))];
        let mut surface = VirtualSurface::new(&outputs).expect("valid output");

        let ctx = surface.get_context("2d").expect("2d is supported");
        ctx.fill_rect(0.0, 0.0, 10.0, 10.0);

        assert!(surface.is_update_pending());
    }

    // ── tick / update ─────────────────────────────────────────────────────────

    #[test]
    fn test_tick_without_changes_touches_no_output() {
        // Arrange: no clear/blit expectations, so any call would panic
        let (a, b) = side_by_side();
        let outputs = [share(mock_output(a, None)), share(mock_output(b, None))];
        let mut surface = VirtualSurface::new(&outputs).expect("valid outputs");

        // Act
        let flushed = surface.tick().expect("nothing to flush");

        // Assert
        assert!(!flushed);
        assert_eq!(surface.flushes(), 0);
    }

    #[test]
    fn test_tick_clears_then_blits_each_output_with_its_offset() {
        // Arrange
        let (a, b) = side_by_side();
        let mut seq = Sequence::new();

        let mut first = mock_output(a, None);
        first.expect_clear().times(1).in_sequence(&mut seq).returning(|| Ok(()));
        first
            .expect_blit()
            .withf(|_, rect| *rect == Rectangle::from_xywh(0, 0, 100, 100))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut second = mock_output(b, None);
        second.expect_clear().times(1).in_sequence(&mut seq).returning(|| Ok(()));
        second
            .expect_blit()
            .withf(|_, rect| *rect == Rectangle::from_xywh(100, 0, 100, 100))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let outputs = [share(first), share(second)];
        let mut surface = VirtualSurface::new(&outputs).expect("valid outputs");

        // Act
        let ctx = surface.get_context(CONTEXT_2D).expect("2d");
        ctx.set_fill_style(Color::from_rgba8(0, 255, 0, 255).into());
        ctx.fill_rect(0.0, 0.0, 200.0, 100.0);
        let flushed = surface.tick().expect("flush succeeds");

        // Assert
        assert!(flushed);
        assert!(!surface.is_update_pending());
        assert_eq!(surface.flushes(), 1);
    }

    #[test]
    fn test_tick_reads_scaled_crop_for_scaled_output() {
        // Arrange: 200×200 physical output tagged "2"
        let layout = Rectangle::from_xywh(0, 0, 200, 200);
        let mut output = mock_output(layout, Some("2"));
        output.expect_clear().times(1).returning(|| Ok(()));
        output
            .expect_blit()
            .withf(|source, rect| {
                source.width() == 100 && *rect == Rectangle::from_xywh(0, 0, 100, 100)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let outputs = [share(output)];
        let mut surface = VirtualSurface::new(&outputs).expect("valid output");

        // Act
        surface
            .get_context("2d")
            .expect("2d")
            .fill_rect(0.0, 0.0, 100.0, 100.0);

        // Assert
        assert!(surface.tick().expect("flush succeeds"));
    }

    #[test]
    fn test_tick_offsets_are_relative_to_bounds_origin() {
        // Arrange: wall starting at negative coordinates
        let left = Rectangle::from_xywh(-50, 10, 50, 20);
        let right = Rectangle::from_xywh(0, 10, 50, 20);

        let mut first = mock_output(left, None);
        first.expect_clear().returning(|| Ok(()));
        first
            .expect_blit()
            .withf(|_, rect| rect.start == Point::new(0, 0))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut second = mock_output(right, None);
        second.expect_clear().returning(|| Ok(()));
        second
            .expect_blit()
            .withf(|_, rect| rect.start == Point::new(50, 0))
            .times(1)
            .returning(|_, _| Ok(()));

        let outputs = [share(first), share(second)];
        let mut surface = VirtualSurface::new(&outputs).expect("valid outputs");

        // Act
        surface.get_context("2d").expect("2d").fill_rect(0.0, 0.0, 1.0, 1.0);

        // Assert
        assert!(surface.tick().expect("flush succeeds"));
    }

    #[test]
    fn test_many_draws_in_one_tick_flush_once() {
        // Arrange
        let (a, _) = side_by_side();
        let mut output = mock_output(a, None);
        output.expect_clear().times(1).returning(|| Ok(()));
        output.expect_blit().times(1).returning(|_, _| Ok(()));
        let outputs = [share(output)];
        let mut surface = VirtualSurface::new(&outputs).expect("valid output");

        // Act
        let ctx = surface.get_context("2d").expect("2d");
        for i in 0..20 {
            ctx.fill_rect(i as f32, 0.0, 1.0, 1.0);
        }
        let first = surface.tick().expect("flush succeeds");
        let second = surface.tick().expect("idle tick");

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(surface.flushes(), 1);
    }

    #[test]
    fn test_output_failure_stops_flush_and_is_propagated() {
        // Arrange: first output fails to clear; second must never be touched
        let (a, b) = side_by_side();
        let mut first = mock_output(a, None);
        first
            .expect_clear()
            .times(1)
            .returning(|| Err(OutputError::Clear("device lost".into())));
        first.expect_blit().times(0);
        let second = mock_output(b, None);

        let outputs = [share(first), share(second)];
        let mut surface = VirtualSurface::new(&outputs).expect("valid outputs");
        surface.get_context("2d").expect("2d").fill_rect(0.0, 0.0, 1.0, 1.0);

        // Act
        let result = surface.tick();

        // Assert
        assert!(matches!(
            result,
            Err(SurfaceError::Output { index: 0, source: OutputError::Clear(_) })
        ));
        assert!(!surface.is_update_pending(), "no retry is scheduled");
    }

    #[test]
    fn test_released_output_is_reported() {
        // Arrange
        let (a, _) = side_by_side();
        let output = share(mock_output(a, None));
        let mut surface =
            VirtualSurface::new(std::slice::from_ref(&output)).expect("valid output");
        drop(output);
        surface.get_context("2d").expect("2d").fill_rect(0.0, 0.0, 1.0, 1.0);

        // Act
        let result = surface.tick();

        // Assert
        assert!(matches!(result, Err(SurfaceError::OutputReleased { index: 0 })));
    }

    #[test]
    fn test_output_borrowed_by_host_is_reported_busy() {
        let (a, _) = side_by_side();
        let output = share(mock_output(a, None));
        let mut surface =
            VirtualSurface::new(std::slice::from_ref(&output)).expect("valid output");
        surface.get_context("2d").expect("2d").fill_rect(0.0, 0.0, 1.0, 1.0);

        let _guard = output.borrow_mut();
        let result = surface.tick();

        assert!(matches!(result, Err(SurfaceError::OutputBusy { index: 0 })));
    }

    // ── Queries and export ────────────────────────────────────────────────────

    #[test]
    fn test_regions_intersecting_maps_buffer_rect_to_outputs() {
        let (a, b) = side_by_side();
        let outputs = [share(mock_output(a, None)), share(mock_output(b, None))];
        let surface = VirtualSurface::new(&outputs).expect("valid outputs");

        let left_only = surface.regions_intersecting(&Rectangle::from_xywh(10, 10, 20, 20));
        let both = surface.regions_intersecting(&Rectangle::from_xywh(90, 10, 20, 20));

        assert_eq!(left_only.len(), 1);
        assert_eq!(*left_only[0].logical(), a);
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_export_does_not_schedule_a_flush() {
        // Arrange
        let (a, _) = side_by_side();
        let outputs = [share(mock_output(a, None))];
        let surface = VirtualSurface::new(&outputs).expect("valid output");

        // Act
        let png = surface.to_png().expect("encodes");
        let url = surface.to_data_url().expect("encodes");

        // Assert
        assert_eq!(&png[1..4], b"PNG");
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(STANDARD.decode(&url[PNG_DATA_URL_PREFIX.len()..]).expect("base64"), png);
        assert!(!surface.is_update_pending());
    }
}
