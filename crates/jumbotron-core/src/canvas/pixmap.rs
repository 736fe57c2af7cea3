//! `PixmapContext`: the real 2D context, drawing into a `tiny-skia` pixmap.
//!
//! The current path is stored in *device* space: every point is mapped
//! through the transform that is current when the point is added, the way a
//! browser canvas does.  Filling and stroking therefore use the identity
//! transform.

use std::f32::consts::{FRAC_PI_2, TAU};

use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, FilterQuality, GradientStop, LineCap, LineJoin,
    LinearGradient, Mask, Paint, Path, PathBuilder, Pattern, Pixmap, RadialGradient, Rect, Shader,
    SpreadMode, Stroke, StrokeDash, Transform,
};

use super::{Canvas2d, CanvasError, ColorStop, ImageData, PaintStyle};

/// Largest buffer a context will allocate, in pixels (1 GiB of RGBA).
pub const MAX_PIXELS: u64 = 1 << 28;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),
    CubicTo(f32, f32, f32, f32, f32, f32),
    Close,
}

/// Everything `save` pushes and `restore` pops.
#[derive(Clone)]
struct DrawState {
    fill_style: PaintStyle,
    stroke_style: PaintStyle,
    line_width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f32,
    line_dash: Vec<f32>,
    line_dash_offset: f32,
    global_alpha: f32,
    composite: BlendMode,
    smoothing: bool,
    transform: Transform,
    clip: Option<Mask>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill_style: PaintStyle::Solid(Color::BLACK),
            stroke_style: PaintStyle::Solid(Color::BLACK),
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
            global_alpha: 1.0,
            composite: BlendMode::SourceOver,
            smoothing: true,
            transform: Transform::identity(),
            clip: None,
        }
    }
}

/// A 2D drawing context over an owned pixel buffer.
pub struct PixmapContext {
    pixmap: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<Segment>,
    /// Device-space start of the current subpath.
    subpath_start: Option<(f32, f32)>,
    /// Device-space current point.
    current: Option<(f32, f32)>,
}

impl PixmapContext {
    /// Allocates a transparent `width × height` buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] when either side is zero or
    /// the buffer would exceed [`MAX_PIXELS`].
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        let invalid = CanvasError::InvalidDimensions { width, height };
        if u64::from(width) * u64::from(height) > MAX_PIXELS {
            return Err(invalid);
        }
        let pixmap = Pixmap::new(width, height).ok_or(invalid)?;
        Ok(Self::from_pixmap(pixmap))
    }

    /// Wraps an existing pixmap with a fresh drawing state.
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            subpath_start: None,
            current: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// The pixel buffer.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Mutable access to the pixel buffer, bypassing the drawing state.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Encodes the buffer as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the PNG encoder fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.pixmap
            .encode_png()
            .map_err(|e| CanvasError::Encode(e.to_string()))
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let t = &self.state.transform;
        (t.sx * x + t.kx * y + t.tx, t.ky * x + t.sy * y + t.ty)
    }

    /// Starts a subpath at `(x, y)` when there is no current point.
    fn ensure_subpath(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.move_to(x, y);
        }
    }

    fn build_path(&self) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for segment in &self.path {
            match *segment {
                Segment::MoveTo(x, y) => pb.move_to(x, y),
                Segment::LineTo(x, y) => pb.line_to(x, y),
                Segment::QuadTo(x1, y1, x, y) => pb.quad_to(x1, y1, x, y),
                Segment::CubicTo(x1, y1, x2, y2, x, y) => pb.cubic_to(x1, y1, x2, y2, x, y),
                Segment::Close => pb.close(),
            }
        }
        pb.finish()
    }

    /// Device-space path of a user-space rectangle.
    fn rect_path(&self, x: f32, y: f32, width: f32, height: f32) -> Option<Path> {
        let corners = [
            self.map(x, y),
            self.map(x + width, y),
            self.map(x + width, y + height),
            self.map(x, y + height),
        ];
        let mut pb = PathBuilder::new();
        pb.move_to(corners[0].0, corners[0].1);
        for &(cx, cy) in &corners[1..] {
            pb.line_to(cx, cy);
        }
        pb.close();
        pb.finish()
    }

    /// Inverse of [`Self::map`]; `None` for a degenerate transform.
    fn unmap(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let t = self.state.transform.invert()?;
        Some((t.sx * x + t.kx * y + t.tx, t.ky * x + t.sy * y + t.ty))
    }

    fn with_alpha(&self, mut color: Color) -> Color {
        color.set_alpha(color.alpha() * self.state.global_alpha);
        color
    }

    /// The paint for `style`, or `None` when the style paints nothing.
    fn style_paint(&self, style: &PaintStyle) -> Option<Paint<'static>> {
        let shader = match style {
            PaintStyle::Solid(color) => Shader::SolidColor(self.with_alpha(*color)),
            PaintStyle::LinearGradient { x0, y0, x1, y1, stops } => LinearGradient::new(
                tiny_skia::Point::from_xy(*x0, *y0),
                tiny_skia::Point::from_xy(*x1, *y1),
                self.gradient_stops(stops),
                SpreadMode::Pad,
                self.state.transform,
            )?,
            PaintStyle::RadialGradient { fx, fy, cx, cy, radius, stops } => RadialGradient::new(
                tiny_skia::Point::from_xy(*fx, *fy),
                tiny_skia::Point::from_xy(*cx, *cy),
                *radius,
                self.gradient_stops(stops),
                SpreadMode::Pad,
                self.state.transform,
            )?,
        };
        Some(Paint {
            shader,
            blend_mode: self.state.composite,
            anti_alias: true,
            ..Paint::default()
        })
    }

    /// Stops sorted by offset (ties keep insertion order) with global alpha applied.
    fn gradient_stops(&self, stops: &[ColorStop]) -> Vec<GradientStop> {
        let mut sorted = stops.to_vec();
        sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        sorted
            .into_iter()
            .map(|stop| GradientStop::new(stop.offset, self.with_alpha(stop.color)))
            .collect()
    }

    fn stroke_params(&self) -> Stroke {
        // Paths are already in device space, so the width follows the
        // transform's area scale.
        let t = &self.state.transform;
        let scale = (t.sx * t.sy - t.kx * t.ky).abs().sqrt();
        Stroke {
            width: self.state.line_width * scale,
            miter_limit: self.state.miter_limit,
            line_cap: self.state.line_cap,
            line_join: self.state.line_join,
            dash: if self.state.line_dash.is_empty() {
                None
            } else {
                StrokeDash::new(self.state.line_dash.clone(), self.state.line_dash_offset)
            },
        }
    }

    fn fill_device_path(&mut self, path: &Path, paint: &Paint, rule: FillRule) {
        self.pixmap.fill_path(
            path,
            paint,
            rule,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    fn stroke_device_path(&mut self, path: &Path) {
        let Some(paint) = self.style_paint(&self.state.stroke_style) else {
            return;
        };
        let stroke = self.stroke_params();
        self.pixmap.stroke_path(
            path,
            &paint,
            &stroke,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }
}

/// Signed sweep of an arc, following canvas rules: a full turn or more
/// draws the whole circle, anything else is normalised into one turn in
/// the requested direction.
fn arc_sweep(start: f32, end: f32, counterclockwise: bool) -> f32 {
    let raw = end - start;
    if !counterclockwise {
        if raw >= TAU {
            TAU
        } else {
            raw.rem_euclid(TAU)
        }
    } else if raw <= -TAU {
        -TAU
    } else {
        -(-raw).rem_euclid(TAU)
    }
}

impl Canvas2d for PixmapContext {
    // ── Properties ────────────────────────────────────────────────────────────

    fn fill_style(&self) -> PaintStyle {
        self.state.fill_style.clone()
    }

    fn set_fill_style(&mut self, style: PaintStyle) {
        if style.is_valid() {
            self.state.fill_style = style;
        }
    }

    fn stroke_style(&self) -> PaintStyle {
        self.state.stroke_style.clone()
    }

    fn set_stroke_style(&mut self, style: PaintStyle) {
        if style.is_valid() {
            self.state.stroke_style = style;
        }
    }

    fn line_width(&self) -> f32 {
        self.state.line_width
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn line_cap(&self) -> LineCap {
        self.state.line_cap
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    fn line_join(&self) -> LineJoin {
        self.state.line_join
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    fn miter_limit(&self) -> f32 {
        self.state.miter_limit
    }

    fn set_miter_limit(&mut self, limit: f32) {
        if limit.is_finite() && limit > 0.0 {
            self.state.miter_limit = limit;
        }
    }

    fn line_dash(&self) -> Vec<f32> {
        self.state.line_dash.clone()
    }

    fn set_line_dash(&mut self, segments: Vec<f32>) {
        if segments.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return;
        }
        // An odd list is repeated to make it even.
        self.state.line_dash = if segments.len() % 2 == 1 {
            segments.iter().chain(segments.iter()).copied().collect()
        } else {
            segments
        };
    }

    fn line_dash_offset(&self) -> f32 {
        self.state.line_dash_offset
    }

    fn set_line_dash_offset(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.line_dash_offset = offset;
        }
    }

    fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    fn global_composite_operation(&self) -> BlendMode {
        self.state.composite
    }

    fn set_global_composite_operation(&mut self, mode: BlendMode) {
        self.state.composite = mode;
    }

    fn image_smoothing_enabled(&self) -> bool {
        self.state.smoothing
    }

    fn set_image_smoothing_enabled(&mut self, enabled: bool) {
        self.state.smoothing = enabled;
    }

    // ── State stack ───────────────────────────────────────────────────────────

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    // ── Transform ─────────────────────────────────────────────────────────────

    fn scale(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_scale(x, y);
    }

    fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_row(cos, sin, -sin, cos, 0.0, 0.0));
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_translate(x, y);
    }

    fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_row(a, b, c, d, e, f));
    }

    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.state.transform = Transform::from_row(a, b, c, d, e, f);
    }

    fn reset_transform(&mut self) {
        self.state.transform = Transform::identity();
    }

    fn get_transform(&self) -> Transform {
        self.state.transform
    }

    // ── Path ──────────────────────────────────────────────────────────────────

    fn begin_path(&mut self) {
        self.path.clear();
        self.subpath_start = None;
        self.current = None;
    }

    fn close_path(&mut self) {
        if let Some(start) = self.subpath_start {
            self.path.push(Segment::Close);
            self.current = Some(start);
        }
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.push(Segment::MoveTo(p.0, p.1));
        self.subpath_start = Some(p);
        self.current = Some(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        let p = self.map(x, y);
        self.path.push(Segment::LineTo(p.0, p.1));
        self.current = Some(p);
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        self.ensure_subpath(cpx, cpy);
        let c = self.map(cpx, cpy);
        let p = self.map(x, y);
        self.path.push(Segment::QuadTo(c.0, c.1, p.0, p.1));
        self.current = Some(p);
    }

    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        self.ensure_subpath(cp1x, cp1y);
        let c1 = self.map(cp1x, cp1y);
        let c2 = self.map(cp2x, cp2y);
        let p = self.map(x, y);
        self.path
            .push(Segment::CubicTo(c1.0, c1.1, c2.0, c2.1, p.0, p.1));
        self.current = Some(p);
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32, counterclockwise: bool) {
        self.ellipse(x, y, radius, radius, 0.0, start_angle, end_angle, counterclockwise);
    }

    fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        if !radius.is_finite() || radius < 0.0 {
            return;
        }
        self.ensure_subpath(x1, y1);
        let Some((x0, y0)) = self.current.and_then(|(cx, cy)| self.unmap(cx, cy)) else {
            return;
        };

        let (ax, ay) = (x0 - x1, y0 - y1);
        let (bx, by) = (x2 - x1, y2 - y1);
        let (la, lb) = (ax.hypot(ay), bx.hypot(by));
        if radius == 0.0 || la == 0.0 || lb == 0.0 {
            self.line_to(x1, y1);
            return;
        }
        let (ux, uy) = (ax / la, ay / la);
        let (vx, vy) = (bx / lb, by / lb);
        let cross = ux * vy - uy * vx;
        if cross.abs() < 1e-6 {
            // Collinear points: the corner degenerates to a straight line.
            self.line_to(x1, y1);
            return;
        }

        // Half the angle between the two legs decides where the circle
        // touches them and how far its centre sits from the corner.
        let half = (ux * vx + uy * vy).clamp(-1.0, 1.0).acos() / 2.0;
        let tangent = radius / half.tan();
        let (t1x, t1y) = (x1 + ux * tangent, y1 + uy * tangent);
        let (t2x, t2y) = (x1 + vx * tangent, y1 + vy * tangent);
        let (bisx, bisy) = (ux + vx, uy + vy);
        let bis_len = bisx.hypot(bisy);
        let centre_distance = radius / half.sin();
        let (cx, cy) = (
            x1 + bisx / bis_len * centre_distance,
            y1 + bisy / bis_len * centre_distance,
        );

        let start = (t1y - cy).atan2(t1x - cx);
        let end = (t2y - cy).atan2(t2x - cx);
        // The legs point away from the corner, so a positive cross product
        // means the path turns toward decreasing angles.
        self.arc(cx, cy, radius, start, end, cross > 0.0);
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
        if [radius_x, radius_y].iter().any(|r| !r.is_finite() || *r < 0.0) {
            return;
        }
        let sweep = arc_sweep(start_angle, end_angle, counterclockwise);
        let (sin_r, cos_r) = rotation.sin_cos();
        // Point and tangent on the rotated ellipse at angle `a`.
        let at = |a: f32| {
            let (sin_a, cos_a) = a.sin_cos();
            let (px, py) = (radius_x * cos_a, radius_y * sin_a);
            let (dx, dy) = (-radius_x * sin_a, radius_y * cos_a);
            (
                (x + px * cos_r - py * sin_r, y + px * sin_r + py * cos_r),
                (dx * cos_r - dy * sin_r, dx * sin_r + dy * cos_r),
            )
        };

        let ((sx, sy), _) = at(start_angle);
        if self.current.is_some() {
            self.line_to(sx, sy);
        } else {
            self.move_to(sx, sy);
        }
        if sweep == 0.0 || radius_x == 0.0 || radius_y == 0.0 {
            return;
        }

        // Cubic approximation, one segment per quarter turn at most.
        let segments = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / segments as f32;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        let mut a0 = start_angle;
        for _ in 0..segments {
            let a1 = a0 + step;
            let (p0, d0) = at(a0);
            let (p3, d3) = at(a1);
            let p1 = self.map(p0.0 + k * d0.0, p0.1 + k * d0.1);
            let p2 = self.map(p3.0 - k * d3.0, p3.1 - k * d3.1);
            let end = self.map(p3.0, p3.1);
            self.path
                .push(Segment::CubicTo(p1.0, p1.1, p2.0, p2.1, end.0, end.1));
            self.current = Some(end);
            a0 = a1;
        }
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn fill(&mut self, rule: FillRule) {
        if let (Some(path), Some(paint)) = (self.build_path(), self.style_paint(&self.state.fill_style)) {
            self.fill_device_path(&path, &paint, rule);
        }
    }

    fn stroke(&mut self) {
        if let Some(path) = self.build_path() {
            self.stroke_device_path(&path);
        }
    }

    fn clip(&mut self, rule: FillRule) {
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        // An empty path clips everything away.
        if let Some(path) = self.build_path() {
            mask.fill_path(&path, rule, true, Transform::identity());
        }
        if let Some(existing) = &self.state.clip {
            for (coverage, prior) in mask.data_mut().iter_mut().zip(existing.data()) {
                *coverage = ((u16::from(*coverage) * u16::from(*prior)) / 255) as u8;
            }
        }
        self.state.clip = Some(mask);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width == 0.0 || height == 0.0 {
            return;
        }
        if let (Some(path), Some(paint)) = (
            self.rect_path(x, y, width, height),
            self.style_paint(&self.state.fill_style),
        ) {
            self.fill_device_path(&path, &paint, FillRule::Winding);
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if let Some(path) = self.rect_path(x, y, width, height) {
            self.stroke_device_path(&path);
        }
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width == 0.0 || height == 0.0 {
            return;
        }
        if let Some(path) = self.rect_path(x, y, width, height) {
            let mut paint = Paint::default();
            paint.set_color(Color::TRANSPARENT);
            paint.blend_mode = BlendMode::Clear;
            paint.anti_alias = false;
            self.fill_device_path(&path, &paint, FillRule::Winding);
        }
    }

    // ── Images ────────────────────────────────────────────────────────────────

    fn draw_image(&mut self, image: &Pixmap, dx: f32, dy: f32) {
        let (w, h) = (image.width() as f32, image.height() as f32);
        self.draw_image_cropped(image, 0.0, 0.0, w, h, dx, dy, w, h);
    }

    fn draw_image_scaled(&mut self, image: &Pixmap, dx: f32, dy: f32, dw: f32, dh: f32) {
        let (w, h) = (image.width() as f32, image.height() as f32);
        self.draw_image_cropped(image, 0.0, 0.0, w, h, dx, dy, dw, dh);
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
        if !(sw > 0.0 && sh > 0.0) {
            return;
        }
        let Some(dst) = Rect::from_xywh(dx, dy, dw, dh) else {
            return;
        };
        let (kx, ky) = (dw / sw, dh / sh);
        let quality = if self.state.smoothing {
            FilterQuality::Bilinear
        } else {
            FilterQuality::Nearest
        };
        let mut paint = Paint::default();
        paint.shader = Pattern::new(
            image.as_ref(),
            SpreadMode::Pad,
            quality,
            self.state.global_alpha,
            Transform::from_row(kx, 0.0, 0.0, ky, dx - sx * kx, dy - sy * ky),
        );
        paint.blend_mode = self.state.composite;
        paint.anti_alias = true;
        self.pixmap.fill_rect(
            dst,
            &paint,
            self.state.transform,
            self.state.clip.as_ref(),
        );
    }

    // ── Pixel data ────────────────────────────────────────────────────────────

    fn create_image_data(&self, width: u32, height: u32) -> ImageData {
        ImageData::new(width, height)
    }

    fn get_image_data(&self, sx: i32, sy: i32, width: u32, height: u32) -> ImageData {
        let mut image = ImageData::new(width, height);
        let (buffer_width, buffer_height) = (i64::from(self.width()), i64::from(self.height()));
        let data = image.data_mut();
        for row in 0..i64::from(height) {
            for col in 0..i64::from(width) {
                let (px, py) = (i64::from(sx) + col, i64::from(sy) + row);
                if px < 0 || py < 0 || px >= buffer_width || py >= buffer_height {
                    continue;
                }
                if let Some(pixel) = self.pixmap.pixel(px as u32, py as u32) {
                    let c = pixel.demultiply();
                    let i = (row * i64::from(width) + col) as usize * 4;
                    data[i..i + 4].copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
                }
            }
        }
        image
    }

    fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32) {
        let (buffer_width, buffer_height) = (i64::from(self.width()), i64::from(self.height()));
        let (image_width, image_height) = (i64::from(image.width()), i64::from(image.height()));
        let rgba = image.data();
        let pixels = self.pixmap.pixels_mut();
        for row in 0..image_height {
            for col in 0..image_width {
                let (px, py) = (i64::from(dx) + col, i64::from(dy) + row);
                if px < 0 || py < 0 || px >= buffer_width || py >= buffer_height {
                    continue;
                }
                let i = (row * image_width + col) as usize * 4;
                let [r, g, b, a] = [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]];
                pixels[(py * buffer_width + px) as usize] = ColorU8::from_rgba(r, g, b, a).premultiply();
            }
        }
    }

    // ── Hit testing ───────────────────────────────────────────────────────────

    fn is_point_in_path(&self, x: f32, y: f32, rule: FillRule) -> bool {
        let Some(path) = self.build_path() else {
            return false;
        };
        let Some(mut coverage) = Mask::new(1, 1) else {
            return false;
        };
        // Rasterise the single pixel whose centre sits on (x, y).
        coverage.fill_path(&path, rule, false, Transform::from_translate(0.5 - x, 0.5 - y));
        coverage.data()[0] > 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
