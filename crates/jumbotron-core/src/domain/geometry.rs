//! Geometry value types for the shared output coordinate space.
//!
//! Every physical output, the virtual surface and every crop taken from the
//! buffer is described with the same two types:
//!
//! - [`Point`] – an integer pixel position.
//! - [`Rectangle`] – a `start`/`end` pair of points.
//!
//! Rectangles use *closed* bounds for the intersection test: two rectangles
//! that merely share an edge are considered to intersect.  This matches how
//! the virtual surface decides which outputs a region touches.
//!
//! Coordinates span the whole `i32` range.  Sizes are measured in `i64` so a
//! rectangle from `i32::MIN` to `i32::MAX` still reports its exact width, and
//! point arithmetic saturates at the edges of the coordinate space.

use std::ops::{Add, Sub};

/// An integer position in the shared coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a point at `(x, y)`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

/// Length of `[start, end]`, exact for every pair of `i32` values.
fn span(start: i32, end: i32) -> u32 {
    (i64::from(end) - i64::from(start)) as u32
}

/// `origin + len`, clamped to `i32::MAX`.
fn extend(origin: i32, len: u32) -> i32 {
    i32::try_from(i64::from(origin) + i64::from(len)).unwrap_or(i32::MAX)
}

/// An axis-aligned rectangle described by its `start` (top-left) and `end`
/// (bottom-right) corners.
///
/// A rectangle whose `start` lies beyond its `end` on either axis is
/// *degenerate* and means "no region".  [`Rectangle::EMPTY`] is the canonical
/// degenerate value and the seed of every union fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub start: Point,
    pub end: Point,
}

impl Rectangle {
    /// The "no region" rectangle.  Any real rectangle unioned with it yields
    /// that rectangle unchanged.
    pub const EMPTY: Rectangle = Rectangle {
        start: Point::new(i32::MAX, i32::MAX),
        end: Point::new(i32::MIN, i32::MIN),
    };

    /// Creates a rectangle from its two corners.
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Creates a rectangle from a top-left corner and a size.
    ///
    /// An end corner past `i32::MAX` is clamped to `i32::MAX`.
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            start: Point::new(x, y),
            end: Point::new(extend(x, width), extend(y, height)),
        }
    }

    /// Returns `true` for a degenerate rectangle (`start` beyond `end`).
    pub fn is_empty(&self) -> bool {
        self.start.x > self.end.x || self.start.y > self.end.y
    }

    /// Width in pixels; `0` for a degenerate rectangle.
    pub fn width(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            span(self.start.x, self.end.x)
        }
    }

    /// Height in pixels; `0` for a degenerate rectangle.
    pub fn height(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            span(self.start.y, self.end.y)
        }
    }

    /// Returns `true` if the two rectangles overlap or touch on every axis.
    ///
    /// The test is symmetric: `a.intersects(&b) == b.intersects(&a)`.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.start.x <= other.end.x
            && self.end.x >= other.start.x
            && self.start.y <= other.end.y
            && self.end.y >= other.start.y
    }

    /// Returns the smallest rectangle containing both `self` and `other`.
    ///
    /// Degenerate operands are ignored, so folding from [`Rectangle::EMPTY`]
    /// works as expected.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rectangle {
            start: Point::new(self.start.x.min(other.start.x), self.start.y.min(other.start.y)),
            end: Point::new(self.end.x.max(other.end.x), self.end.y.max(other.end.y)),
        }
    }

    /// Returns the area shared by both rectangles.
    ///
    /// The result is degenerate when they do not overlap and has zero width
    /// or height when they only touch.
    pub fn intersection(&self, other: &Rectangle) -> Rectangle {
        Rectangle {
            start: Point::new(self.start.x.max(other.start.x), self.start.y.max(other.start.y)),
            end: Point::new(self.end.x.min(other.end.x), self.end.y.min(other.end.y)),
        }
    }
}

impl AsRef<Rectangle> for Rectangle {
    fn as_ref(&self) -> &Rectangle {
        self
    }
}

/// Returns every candidate that intersects `source`, preserving input order.
///
/// This is a linear scan: O(n) per query.  Candidate counts are the number of
/// physical outputs on a wall, so a scan beats building an index.  Replace it
/// with an R-tree if callers ever query thousands of rectangles.
pub fn get_intersecting_rects<'a, R>(source: &Rectangle, candidates: &'a [R]) -> Vec<&'a R>
where
    R: AsRef<Rectangle>,
{
    candidates
        .iter()
        .filter(|candidate| source.intersects(candidate.as_ref()))
        .collect()
}

/// Folds `rects` into their bounding rectangle.
///
/// Returns [`Rectangle::EMPTY`] when `rects` yields nothing.
pub fn bounding_rect<'a, I>(rects: I) -> Rectangle
where
    I: IntoIterator<Item = &'a Rectangle>,
{
    rects
        .into_iter()
        .fold(Rectangle::EMPTY, |acc, rect| acc.union(rect))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
