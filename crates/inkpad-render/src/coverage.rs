//! Per-command coverage masks and the geometry that fills them.

use kurbo::{BezPath, PathEl, Point, Rect};

/// Which pixels one draw command touches. Each pixel is blended at most
/// once per command, however many stamps land on it.
pub(crate) struct Coverage {
    width: u32,
    height: u32,
    bits: Vec<bool>,
    touched: Option<(u32, u32, u32, u32)>,
}

impl Coverage {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
            touched: None,
        }
    }

    pub(crate) fn mark(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        self.bits[y as usize * self.width as usize + x as usize] = true;
        self.touched = Some(match self.touched {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    /// The target extent in pixel coordinates.
    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.touched.is_none()
    }

    /// Covered pixels in row-major order.
    pub(crate) fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (x0, y0, x1, y1) = self.touched.unwrap_or((1, 1, 0, 0));
        (y0..=y1)
            .flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
            .filter(|&(x, y)| self.bits[y as usize * self.width as usize + x as usize])
    }

    /// Stamp the brush footprint centered on pixel `(cx, cy)`. Only the
    /// part of the footprint inside the target is visited.
    pub(crate) fn stamp(&mut self, cx: i64, cy: i64, radius: f64, round: bool) {
        let reach = radius.max(0.0).floor() as i64;
        let r2 = radius * radius;
        let (w, h) = (self.width as i64, self.height as i64);
        let (x0, x1) = ((-reach).max(-cx), reach.min(w.saturating_sub(1).saturating_sub(cx)));
        let (y0, y1) = ((-reach).max(-cy), reach.min(h.saturating_sub(1).saturating_sub(cy)));
        for dy in y0..=y1 {
            for dx in x0..=x1 {
                let (fx, fy) = (dx as f64, dy as f64);
                if !round || fx * fx + fy * fy <= r2 {
                    self.mark(cx + dx, cy + dy);
                }
            }
        }
    }

    /// Even-odd scanline fill, sampling at pixel centers.
    pub(crate) fn fill_even_odd(&mut self, polygons: &[Subpath]) {
        let points = polygons.iter().flat_map(|p| p.points.iter());
        let (min_y, max_y) = points.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }
        let first_row = min_y.floor().max(0.0) as i64;
        let last_row = max_y.ceil().min(self.height as f64) as i64;
        let mut crossings = Vec::new();
        for y in first_row..last_row {
            let sy = y as f64 + 0.5;
            crossings.clear();
            for polygon in polygons {
                let n = polygon.points.len();
                if n < 3 {
                    continue;
                }
                for i in 0..n {
                    let a = polygon.points[i];
                    let b = polygon.points[(i + 1) % n];
                    if (a.y <= sy) != (b.y <= sy) {
                        crossings.push(a.x + (sy - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil() as i64;
                let end = (span[1] - 0.5).floor() as i64;
                for x in start.max(0)..=end.min(self.width as i64 - 1) {
                    self.mark(x, y);
                }
            }
        }
    }
}

/// One flattened subpath.
#[derive(Debug, Default)]
pub(crate) struct Subpath {
    pub(crate) points: Vec<Point>,
    pub(crate) closed: bool,
}

/// Flatten curves into polylines within `tolerance`.
pub(crate) fn flatten(path: &BezPath, tolerance: f64) -> Vec<Subpath> {
    let mut subpaths: Vec<Subpath> = Vec::new();
    kurbo::flatten(path, tolerance, |el| match el {
        PathEl::MoveTo(p) => subpaths.push(Subpath {
            points: vec![p],
            closed: false,
        }),
        PathEl::LineTo(p) => {
            if let Some(current) = subpaths.last_mut() {
                current.points.push(p);
            }
        }
        PathEl::ClosePath => {
            if let Some(current) = subpaths.last_mut() {
                current.closed = true;
            }
        }
        // Flattening only emits lines.
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    subpaths
}

/// Clip the segment `a`-`b` to `rect` (Liang-Barsky). Endpoints already
/// inside are returned unchanged.
pub(crate) fn clip_segment(a: Point, b: Point, rect: Rect) -> Option<(Point, Point)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-d.x, a.x - rect.x0),
        (d.x, rect.x1 - a.x),
        (-d.y, a.y - rect.y0),
        (d.y, rect.y1 - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
        if t0 > t1 {
            return None;
        }
    }
    let start = if t0 > 0.0 { a + d * t0 } else { a };
    let end = if t1 < 1.0 { a + d * t1 } else { b };
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_ignores_out_of_bounds() {
        let mut coverage = Coverage::new(4, 4);
        coverage.mark(-1, 0);
        coverage.mark(4, 2);
        assert!(coverage.is_empty());
        coverage.mark(3, 3);
        assert_eq!(coverage.pixels().collect::<Vec<_>>(), [(3, 3)]);
    }

    #[test]
    fn test_round_stamp_is_a_disc() {
        let mut coverage = Coverage::new(9, 9);
        coverage.stamp(4, 4, 2.0, true);
        let pixels: Vec<_> = coverage.pixels().collect();
        assert_eq!(pixels.len(), 13);
        assert!(!pixels.contains(&(2, 2)));

        let mut square = Coverage::new(9, 9);
        square.stamp(4, 4, 2.0, false);
        assert_eq!(square.pixels().count(), 25);
    }

    #[test]
    fn test_huge_stamp_stays_on_target() {
        let mut coverage = Coverage::new(4, 4);
        coverage.stamp(-1_000_000, 2, 1.0e9, true);
        assert_eq!(coverage.pixels().count(), 16);

        let mut edge = Coverage::new(4, 4);
        edge.stamp(-2, 1, 2.0, false);
        assert_eq!(edge.pixels().collect::<Vec<_>>(), [(0, 0), (0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn test_clip_segment() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let inside = (Point::new(1.0, 1.0), Point::new(9.0, 4.0));
        assert_eq!(clip_segment(inside.0, inside.1, rect), Some(inside));

        let (a, b) = clip_segment(Point::new(-1.0e9, 5.0), Point::new(1.0e9, 5.0), rect).unwrap();
        assert!((a - Point::new(0.0, 5.0)).hypot() < 1e-3);
        assert!((b - Point::new(10.0, 5.0)).hypot() < 1e-3);

        assert_eq!(clip_segment(Point::new(-5.0, 20.0), Point::new(30.0, 20.0), rect), None);
        assert_eq!(clip_segment(Point::new(-5.0, 0.0), Point::new(0.0, -5.0), Rect::new(1.0, 1.0, 10.0, 10.0)), None);
    }

    #[test]
    fn test_even_odd_fill() {
        let mut coverage = Coverage::new(10, 10);
        let outer = Subpath {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            closed: true,
        };
        let hole = Subpath {
            points: vec![
                Point::new(3.0, 3.0),
                Point::new(7.0, 3.0),
                Point::new(7.0, 7.0),
                Point::new(3.0, 7.0),
            ],
            closed: true,
        };
        coverage.fill_even_odd(&[outer, hole]);
        let pixels: Vec<_> = coverage.pixels().collect();
        assert_eq!(pixels.len(), 100 - 16);
        assert!(pixels.contains(&(1, 1)));
        assert!(!pixels.contains(&(5, 5)));
    }

    #[test]
    fn test_flatten_splits_subpaths() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.quad_to((5.0, 10.0), (10.0, 0.0));
        path.move_to((20.0, 0.0));
        path.line_to((30.0, 0.0));
        path.close_path();
        let subpaths = flatten(&path, 0.25);
        assert_eq!(subpaths.len(), 2);
        assert!(subpaths[0].points.len() > 2);
        assert!(!subpaths[0].closed);
        assert!(subpaths[1].closed);
    }
}
