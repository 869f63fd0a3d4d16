//! Deterministic CPU renderer.

use crate::coverage::{Coverage, Subpath, clip_segment, flatten};
use image::RgbaImage;
use inkpad_core::brush::{Brush, LineCap, LineJoin, Rgba};
use inkpad_core::geometry::rasterize_line;
use inkpad_core::path::{PathInstruction, to_bez_path};
use inkpad_core::render::{BlendMode, DrawCommand, RenderBackend, StrokePattern, blend_over};
use kurbo::{BezPath, Ellipse, Point, Rect, Shape};

/// Renders draw commands into an RGBA buffer on the CPU.
///
/// Output depends only on the commands and the target contents, so the
/// same commands always produce the same bytes. No anti-aliasing.
#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    tolerance: f64,
    dash_length: u32,
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self {
            tolerance: 0.25,
            dash_length: 4,
        }
    }
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Curve flattening tolerance in pixels.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.01);
        self
    }

    /// Length in pixels of each dash and gap for dashed strokes.
    pub fn with_dash_length(mut self, dash_length: u32) -> Self {
        self.dash_length = dash_length.max(1);
        self
    }

    fn draw_path(
        &self,
        target: &mut RgbaImage,
        path: &BezPath,
        brush: &Brush,
        fill: Option<Rgba>,
        blend: BlendMode,
        pattern: StrokePattern,
    ) {
        let subpaths = flatten(path, self.tolerance);

        if let (Some(fill), BlendMode::Normal) = (fill, blend) {
            let mut coverage = Coverage::new(target.width(), target.height());
            coverage.fill_even_odd(&subpaths);
            paint(target, &coverage, fill, BlendMode::Normal);
        }

        let mut coverage = Coverage::new(target.width(), target.height());
        self.stroke(&mut coverage, &subpaths, brush, pattern);
        paint(target, &coverage, brush.stroke_color(), blend);
    }

    fn stroke(&self, coverage: &mut Coverage, subpaths: &[Subpath], brush: &Brush, pattern: StrokePattern) {
        let radius = brush.thickness() / 2.0;
        let round = brush.cap() == LineCap::Round || brush.join() == LineJoin::Round;
        let dash = self.dash_length as usize;
        // Pixels further out than this cannot reach the target.
        let margin = radius.max(0.0) + 1.0;
        let visible = coverage.bounds().inflate(margin, margin);
        let mut step = 0usize;

        for subpath in subpaths {
            let mut points = subpath.points.clone();
            if subpath.closed && points.len() > 1 {
                points.push(points[0]);
            }
            if points.len() == 1 {
                points.push(points[0]);
            }
            for (i, segment) in points.windows(2).enumerate() {
                let (a, b) = (segment[0], segment[1]);
                // Each segment starts where the previous one ended.
                let skip = usize::from(i > 0);
                let start = step;
                if let Some((ca, cb)) = clip_segment(a, b, visible) {
                    let lead = pixel_steps(a, ca);
                    step = start.wrapping_add(lead.max(skip) - skip);
                    let pixels = rasterize_line(ca, cb);
                    for p in pixels.into_iter().skip(skip.saturating_sub(lead)) {
                        let on = match pattern {
                            StrokePattern::Solid => true,
                            StrokePattern::Dashed => (step / dash) % 2 == 0,
                        };
                        step = step.wrapping_add(1);
                        if on {
                            coverage.stamp(p.x as i64, p.y as i64, radius, round);
                        }
                    }
                }
                // Keep the dash phase as if the whole segment was walked.
                step = start.wrapping_add(pixel_steps(a, b)).wrapping_add(1 - skip);
            }
        }
    }

    fn draw_ellipse(&self, target: &mut RgbaImage, rect: Rect, brush: &Brush, fill: Option<Rgba>) {
        let path = Ellipse::from_rect(rect).to_path(self.tolerance);
        self.draw_path(target, &path, brush, fill, BlendMode::Normal, StrokePattern::Solid);
    }
}

/// Number of steps a line walk takes between two points.
fn pixel_steps(a: Point, b: Point) -> usize {
    let dx = (b.x.round() - a.x.round()).abs();
    let dy = (b.y.round() - a.y.round()).abs();
    dx.max(dy) as usize
}

/// Apply one color to every covered pixel.
fn paint(target: &mut RgbaImage, coverage: &Coverage, color: Rgba, blend: BlendMode) {
    if coverage.is_empty() {
        return;
    }
    for (x, y) in coverage.pixels() {
        let pixel = target.get_pixel_mut(x, y);
        match blend {
            BlendMode::Normal => blend_over(pixel, color),
            BlendMode::Clear => pixel.0 = [0, 0, 0, 0],
        }
    }
}

fn draw_image(target: &mut RgbaImage, image: &RgbaImage) {
    let w = target.width().min(image.width());
    let h = target.height().min(image.height());
    for y in 0..h {
        for x in 0..w {
            let [r, g, b, a] = image.get_pixel(x, y).0;
            if a == 0 {
                continue;
            }
            blend_over(target.get_pixel_mut(x, y), Rgba::from_rgba8(r, g, b, a));
        }
    }
}

fn path_of(instructions: &[PathInstruction]) -> Option<BezPath> {
    matches!(instructions.first(), Some(PathInstruction::MoveTo(_))).then(|| to_bez_path(instructions))
}

impl RenderBackend for SoftwareRenderer {
    fn execute(&mut self, target: &mut RgbaImage, commands: &[DrawCommand<'_>]) {
        for command in commands {
            match *command {
                DrawCommand::Image(image) => draw_image(target, image),
                DrawCommand::Path {
                    instructions,
                    brush,
                    fill,
                    blend,
                    pattern,
                } => match path_of(instructions) {
                    Some(path) => self.draw_path(target, &path, brush, fill, blend, pattern),
                    None => log::trace!("Skipping path without a leading move"),
                },
                DrawCommand::Ellipse { rect, brush, fill } => self.draw_ellipse(target, rect, brush, fill),
            }
        }
    }
}
