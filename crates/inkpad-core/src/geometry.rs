//! Geometry kernel: distances, quadrants, containment and line rasterization.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Quadrant of one point relative to another.
///
/// Screen coordinates: y grows downwards, so "lower" means larger y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Quadrant of `a` relative to `b`.
///
/// Ties go to the greater-or-equal side on both axes, so a point equal to
/// `b` is `LowerRight`.
pub fn relative_position(a: Point, b: Point) -> Quadrant {
    let right = a.x >= b.x;
    let lower = a.y >= b.y;
    match (right, lower) {
        (false, false) => Quadrant::UpperLeft,
        (true, false) => Quadrant::UpperRight,
        (false, true) => Quadrant::LowerLeft,
        (true, true) => Quadrant::LowerRight,
    }
}

/// Whether `a` lies within `radius` of `b` (inclusive).
pub fn in_range(a: Point, b: Point, radius: f64) -> bool {
    distance(a, b) <= radius
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Build a normalized rectangle from two opposing corners.
pub fn rect_from_corners(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Inclusive containment test.
///
/// Unlike `kurbo::Rect::contains`, points on the far edges count as inside.
/// The rectangle is normalized first, so it may have been built with
/// negative extents.
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Minimal axis-aligned rectangle enclosing every point, or `None` if there
/// are no points.
pub fn bounding_rect<I>(points: I) -> Option<Rect>
where
    I: IntoIterator<Item = Point>,
{
    let mut points = points.into_iter();
    let first = points.next()?;
    let mut rect = Rect::from_points(first, first);
    for p in points {
        rect = Rect::new(
            rect.x0.min(p.x),
            rect.y0.min(p.y),
            rect.x1.max(p.x),
            rect.y1.max(p.y),
        );
    }
    Some(rect)
}

/// Enumerate the discrete points a straight line passes through.
///
/// Both endpoints are rounded to the pixel grid and walked with an integer
/// error accumulator. The (rounded) endpoint is always the last element.
pub fn rasterize_line(start: Point, end: Point) -> Vec<Point> {
    let (mut x, mut y) = (start.x.round() as i64, start.y.round() as i64);
    let (x1, y1) = (end.x.round() as i64, end.y.round() as i64);

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut points = Vec::with_capacity((dx - dy) as usize + 1);
    while x != x1 || y != y1 {
        points.push(Point::new(x as f64, y as f64));
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points.push(Point::new(x1 as f64, y1 as f64));
    points
}
