//! OperationProxy: the drawing context handed to clients.
//!
//! The proxy implements [`Canvas2d`] by forwarding every call to the buffer's
//! real context.  Reads (`&self` methods) return whatever the real context
//! returns and have no side effects.  Mutations (`&mut self` methods) are
//! applied to the buffer first and then report a change to the
//! [`UpdateScheduler`], so the outputs catch up on the next tick.
//!
//! Behaviour observed through the proxy is identical to the real context:
//! same return values, same resulting pixels.

use jumbotron_core::{
    BlendMode, Canvas2d, FillRule, ImageData, LineCap, LineJoin, PaintStyle, Pixmap, Transform,
};

use super::scheduler::UpdateScheduler;

/// Intercepting wrapper around a drawing context.
#[derive(Debug)]
pub struct OperationProxy<C> {
    inner: C,
    scheduler: UpdateScheduler,
}

impl<C: Canvas2d> OperationProxy<C> {
    /// Wraps `inner` with an idle scheduler.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            scheduler: UpdateScheduler::new(),
        }
    }

    /// The wrapped context.  Read-only so callers cannot bypass scheduling.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Scheduler fed by this proxy.
    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut UpdateScheduler {
        &mut self.scheduler
    }

    /// Applies a mutation to the real context, then schedules a flush.
    fn forward<T>(&mut self, op: impl FnOnce(&mut C) -> T) -> T {
        let result = op(&mut self.inner);
        self.scheduler.schedule();
        result
    }
}

impl<C: Canvas2d> Canvas2d for OperationProxy<C> {
    // ── Properties ────────────────────────────────────────────────────────────

    fn fill_style(&self) -> PaintStyle {
        self.inner.fill_style()
    }

    fn set_fill_style(&mut self, style: PaintStyle) {
        self.forward(|ctx| ctx.set_fill_style(style))
    }

    fn stroke_style(&self) -> PaintStyle {
        self.inner.stroke_style()
    }

    fn set_stroke_style(&mut self, style: PaintStyle) {
        self.forward(|ctx| ctx.set_stroke_style(style))
    }

    fn line_width(&self) -> f32 {
        self.inner.line_width()
    }

    fn set_line_width(&mut self, width: f32) {
        self.forward(|ctx| ctx.set_line_width(width))
    }

    fn line_cap(&self) -> LineCap {
        self.inner.line_cap()
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.forward(|ctx| ctx.set_line_cap(cap))
    }

    fn line_join(&self) -> LineJoin {
        self.inner.line_join()
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.forward(|ctx| ctx.set_line_join(join))
    }

    fn miter_limit(&self) -> f32 {
        self.inner.miter_limit()
    }

    fn set_miter_limit(&mut self, limit: f32) {
        self.forward(|ctx| ctx.set_miter_limit(limit))
    }

    fn line_dash(&self) -> Vec<f32> {
        self.inner.line_dash()
    }

    fn set_line_dash(&mut self, segments: Vec<f32>) {
        self.forward(|ctx| ctx.set_line_dash(segments))
    }

    fn line_dash_offset(&self) -> f32 {
        self.inner.line_dash_offset()
    }

    fn set_line_dash_offset(&mut self, offset: f32) {
        self.forward(|ctx| ctx.set_line_dash_offset(offset))
    }

    fn global_alpha(&self) -> f32 {
        self.inner.global_alpha()
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.forward(|ctx| ctx.set_global_alpha(alpha))
    }

    fn global_composite_operation(&self) -> BlendMode {
        self.inner.global_composite_operation()
    }

    fn set_global_composite_operation(&mut self, mode: BlendMode) {
        self.forward(|ctx| ctx.set_global_composite_operation(mode))
    }

    fn image_smoothing_enabled(&self) -> bool {
        self.inner.image_smoothing_enabled()
    }

    fn set_image_smoothing_enabled(&mut self, enabled: bool) {
        self.forward(|ctx| ctx.set_image_smoothing_enabled(enabled))
    }

    // ── State stack ───────────────────────────────────────────────────────────

    fn save(&mut self) {
        self.forward(|ctx| ctx.save())
    }

    fn restore(&mut self) {
        self.forward(|ctx| ctx.restore())
    }

    // ── Transform ─────────────────────────────────────────────────────────────

    fn scale(&mut self, x: f32, y: f32) {
        self.forward(|ctx| ctx.scale(x, y))
    }

    fn rotate(&mut self, angle: f32) {
        self.forward(|ctx| ctx.rotate(angle))
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.forward(|ctx| ctx.translate(x, y))
    }

    fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.forward(|ctx| ctx.transform(a, b, c, d, e, f))
    }

    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.forward(|ctx| ctx.set_transform(a, b, c, d, e, f))
    }

    fn reset_transform(&mut self) {
        self.forward(|ctx| ctx.reset_transform())
    }

    fn get_transform(&self) -> Transform {
        self.inner.get_transform()
    }

    // ── Path ──────────────────────────────────────────────────────────────────

    fn begin_path(&mut self) {
        self.forward(|ctx| ctx.begin_path())
    }

    fn close_path(&mut self) {
        self.forward(|ctx| ctx.close_path())
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.forward(|ctx| ctx.move_to(x, y))
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.forward(|ctx| ctx.line_to(x, y))
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        self.forward(|ctx| ctx.quadratic_curve_to(cpx, cpy, x, y))
    }

    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        self.forward(|ctx| ctx.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y))
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32, counterclockwise: bool) {
        self.forward(|ctx| ctx.arc(x, y, radius, start_angle, end_angle, counterclockwise))
    }

    fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        self.forward(|ctx| ctx.arc_to(x1, y1, x2, y2, radius))
    }

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
    ) {
        self.forward(|ctx| {
            ctx.ellipse(x, y, radius_x, radius_y, rotation, start_angle, end_angle, counterclockwise)
        })
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.forward(|ctx| ctx.rect(x, y, width, height))
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn fill(&mut self, rule: FillRule) {
        self.forward(|ctx| ctx.fill(rule))
    }

    fn stroke(&mut self) {
        self.forward(|ctx| ctx.stroke())
    }

    fn clip(&mut self, rule: FillRule) {
        self.forward(|ctx| ctx.clip(rule))
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.forward(|ctx| ctx.fill_rect(x, y, width, height))
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.forward(|ctx| ctx.stroke_rect(x, y, width, height))
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.forward(|ctx| ctx.clear_rect(x, y, width, height))
    }

    // ── Images ────────────────────────────────────────────────────────────────

    fn draw_image(&mut self, image: &Pixmap, dx: f32, dy: f32) {
        self.forward(|ctx| ctx.draw_image(image, dx, dy))
    }

    fn draw_image_scaled(&mut self, image: &Pixmap, dx: f32, dy: f32, dw: f32, dh: f32) {
        self.forward(|ctx| ctx.draw_image_scaled(image, dx, dy, dw, dh))
    }

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
    ) {
        self.forward(|ctx| ctx.draw_image_cropped(image, sx, sy, sw, sh, dx, dy, dw, dh))
    }

    // ── Pixel data ────────────────────────────────────────────────────────────

    fn create_image_data(&self, width: u32, height: u32) -> ImageData {
        self.inner.create_image_data(width, height)
    }

    fn get_image_data(&self, sx: i32, sy: i32, width: u32, height: u32) -> ImageData {
        self.inner.get_image_data(sx, sy, width, height)
    }

    fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32) {
        self.forward(|ctx| ctx.put_image_data(image, dx, dy))
    }

    // ── Hit testing ───────────────────────────────────────────────────────────

    fn is_point_in_path(&self, x: f32, y: f32, rule: FillRule) -> bool {
        self.inner.is_point_in_path(x, y, rule)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jumbotron_core::{Color, ColorStop, PixmapContext};

    fn proxy(width: u32, height: u32) -> OperationProxy<PixmapContext> {
        OperationProxy::new(PixmapContext::new(width, height).expect("valid size"))
    }

    fn red() -> Color {
        Color::from_rgba8(255, 0, 0, 255)
    }

    // ── Notification rules ────────────────────────────────────────────────────

    #[test]
    fn test_mutation_schedules_exactly_one_notification() {
        // Arrange
        let mut ctx = proxy(10, 10);

        // Act
        ctx.fill_rect(0.0, 0.0, 5.0, 5.0);

        // Assert
        assert_eq!(ctx.scheduler().notifications(), 1);
        assert!(ctx.scheduler().is_pending());
    }

    #[test]
    fn test_property_write_schedules_notification() {
        let mut ctx = proxy(10, 10);

        ctx.set_fill_style(red().into());

        assert_eq!(ctx.scheduler().notifications(), 1);
        assert_eq!(ctx.fill_style(), PaintStyle::Solid(red()), "property write must reach the real context");
    }

    #[test]
    fn test_reads_never_schedule() {
        // Arrange
        let ctx = proxy(10, 10);

        // Act
        let _ = ctx.fill_style();
        let _ = ctx.stroke_style();
        let _ = ctx.line_width();
        let _ = ctx.line_dash_offset();
        let _ = ctx.get_transform();
        let _ = ctx.get_image_data(0, 0, 2, 2);
        let _ = ctx.create_image_data(2, 2);
        let _ = ctx.is_point_in_path(1.0, 1.0, FillRule::Winding);

        // Assert
        assert_eq!(ctx.scheduler().notifications(), 0);
        assert!(!ctx.scheduler().is_pending());
    }

    #[test]
    fn test_path_building_calls_each_notify() {
        let mut ctx = proxy(10, 10);

        ctx.begin_path();
        ctx.move_to(1.0, 1.0);
        ctx.line_to(8.0, 1.0);
        ctx.line_to(8.0, 8.0);
        ctx.close_path();
        ctx.fill(FillRule::Winding);

        assert_eq!(ctx.scheduler().notifications(), 6);
    }

    #[test]
    fn test_curve_and_dash_members_each_notify() {
        // Arrange
        let mut ctx = proxy(20, 20);

        // Act
        ctx.move_to(1.0, 1.0);
        ctx.arc_to(10.0, 1.0, 10.0, 10.0, 3.0);
        ctx.ellipse(10.0, 10.0, 4.0, 2.0, 0.5, 0.0, 3.0, false);
        ctx.set_line_dash_offset(2.5);
        ctx.set_stroke_style(PaintStyle::LinearGradient {
            x0: 0.0,
            y0: 0.0,
            x1: 20.0,
            y1: 0.0,
            stops: vec![ColorStop::new(0.0, red()), ColorStop::new(1.0, Color::BLACK)],
        });

        // Assert
        assert_eq!(ctx.scheduler().notifications(), 5);
        assert_eq!(ctx.line_dash_offset(), 2.5);
        assert!(matches!(ctx.stroke_style(), PaintStyle::LinearGradient { .. }));
        assert_eq!(ctx.scheduler().notifications(), 5, "getters must not notify");
    }

    #[test]
    fn test_many_mutations_leave_one_flush_pending() {
        // Arrange
        let mut ctx = proxy(10, 10);
        for i in 0..10 {
            ctx.fill_rect(i as f32, 0.0, 1.0, 1.0);
        }

        // Act
        let first = ctx.scheduler_mut().begin_flush();
        let second = ctx.scheduler_mut().begin_flush();

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(ctx.scheduler().flushes(), 1);
    }

    // ── Transparency ──────────────────────────────────────────────────────────

    #[test]
    fn test_proxy_produces_same_pixels_as_real_context() {
        // Arrange
        let mut direct = PixmapContext::new(16, 16).expect("valid size");
        let mut proxied = proxy(16, 16);

        // Act: identical call sequence on both
        for ctx in [&mut direct as &mut dyn Canvas2d, &mut proxied as &mut dyn Canvas2d] {
            ctx.set_fill_style(red().into());
            ctx.translate(2.0, 2.0);
            ctx.fill_rect(0.0, 0.0, 6.0, 6.0);
            ctx.set_stroke_style(Color::from_rgba8(0, 0, 255, 255).into());
            ctx.set_line_width(2.0);
            ctx.stroke_rect(4.0, 4.0, 6.0, 6.0);
            ctx.clear_rect(3.0, 3.0, 1.0, 1.0);
            ctx.set_fill_style(PaintStyle::RadialGradient {
                fx: 8.0,
                fy: 8.0,
                cx: 8.0,
                cy: 8.0,
                radius: 6.0,
                stops: vec![ColorStop::new(0.0, red()), ColorStop::new(1.0, Color::TRANSPARENT)],
            });
            ctx.begin_path();
            ctx.ellipse(6.0, 6.0, 5.0, 3.0, 0.3, 0.0, 6.0, false);
            ctx.fill(FillRule::Winding);
            ctx.set_line_dash(vec![2.0, 1.0]);
            ctx.set_line_dash_offset(1.0);
            ctx.begin_path();
            ctx.move_to(0.0, 0.0);
            ctx.arc_to(12.0, 0.0, 12.0, 12.0, 4.0);
            ctx.stroke();
        }

        // Assert
        assert_eq!(direct.pixmap().data(), proxied.inner().pixmap().data());
    }

    #[test]
    fn test_proxy_returns_real_context_values() {
        // Arrange
        let mut ctx = proxy(8, 8);
        ctx.set_fill_style(red().into());
        ctx.fill_rect(0.0, 0.0, 4.0, 4.0);
        ctx.translate(3.0, 1.0);

        // Act
        let pixels = ctx.get_image_data(0, 0, 8, 8);
        let transform = ctx.get_transform();

        // Assert
        assert_eq!(pixels, ctx.inner().get_image_data(0, 0, 8, 8));
        assert_eq!(pixels.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(transform, ctx.inner().get_transform());
        assert_eq!((transform.tx, transform.ty), (3.0, 1.0));
    }

    #[test]
    fn test_hit_test_is_forwarded() {
        let mut ctx = proxy(10, 10);
        ctx.rect(2.0, 2.0, 4.0, 4.0);

        assert!(ctx.is_point_in_path(3.0, 3.0, FillRule::Winding));
        assert!(!ctx.is_point_in_path(8.0, 8.0, FillRule::Winding));
    }
}
