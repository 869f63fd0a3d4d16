//! Rendering contract between the scene model and a pixel backend.
//!
//! The core never touches pixels itself beyond blending finished rasters.
//! It hands a backend an ordered list of [`DrawCommand`]s and a target
//! buffer; the backend decides how to stroke, fill and anti-alias.

use crate::brush::{Brush, Rgba};
use crate::node::Node;
use crate::path::PathInstruction;
use image::RgbaImage;
use kurbo::{Point, Rect};

/// How a command's pixels combine with what is already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// Covered pixels become fully transparent.
    Clear,
}

/// Stroke dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokePattern {
    #[default]
    Solid,
    Dashed,
}

/// One step of a drawing-command list.
#[derive(Debug, Clone, Copy)]
pub enum DrawCommand<'a> {
    /// Composite a raster at the origin.
    Image(&'a RgbaImage),
    /// Optionally fill, then stroke, a path.
    Path {
        instructions: &'a [PathInstruction],
        brush: &'a Brush,
        fill: Option<Rgba>,
        blend: BlendMode,
        pattern: StrokePattern,
    },
    /// Optionally fill, then stroke, the ellipse inscribed in `rect`.
    Ellipse {
        rect: Rect,
        brush: &'a Brush,
        fill: Option<Rgba>,
    },
}

/// A pixel backend.
///
/// Only [`execute`](RenderBackend::execute) is required; the other
/// operations have portable defaults built on plain pixel access.
pub trait RenderBackend {
    /// Run `commands` in order against `target`.
    fn execute(&mut self, target: &mut RgbaImage, commands: &[DrawCommand<'_>]);

    /// Stack rasters bottom to top, each scaled by its opacity.
    fn composite_rasters(&mut self, width: u32, height: u32, layers: &[(&RgbaImage, f32)]) -> RgbaImage {
        let mut out = new_raster(width, height);
        for (raster, opacity) in layers {
            let w = width.min(raster.width());
            let h = height.min(raster.height());
            for y in 0..h {
                for x in 0..w {
                    let p = raster.get_pixel(x, y).0;
                    if p[3] == 0 {
                        continue;
                    }
                    let src = Rgba::from_rgba8(p[0], p[1], p[2], p[3]).with_opacity(*opacity);
                    blend_over(out.get_pixel_mut(x, y), src);
                }
            }
        }
        out
    }

    /// Read the color under `point`, or `None` outside the raster.
    fn sample(&self, raster: &RgbaImage, point: Point) -> Option<Rgba> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let (x, y) = (point.x.floor() as u32, point.y.floor() as u32);
        let p = raster.get_pixel_checked(x, y)?.0;
        Some(Rgba::from_rgba8(p[0], p[1], p[2], p[3]))
    }

    /// Render a `size`×`size` thumbnail of one node, scaled to fit.
    fn rasterize_glyph(&mut self, node: &Node, size: u32) -> RgbaImage {
        let mut target = new_raster(size, size);
        let bounds = node.bounding_box();
        let pad = (size as f64 * 0.1).max(1.0);
        let avail = (size as f64 - 2.0 * pad).max(1.0);
        let extent = bounds.width().max(bounds.height());
        let scale = if extent > 0.0 { avail / extent } else { 1.0 };
        let offset = Point::new(
            pad + (avail - bounds.width() * scale) / 2.0,
            pad + (avail - bounds.height() * scale) / 2.0,
        );

        let mut glyph = node.snapshot();
        glyph.map_points(|p| {
            Point::new(
                (p.x - bounds.x0) * scale + offset.x,
                (p.y - bounds.y0) * scale + offset.y,
            )
        });
        let brush = node.brush().with_thickness((node.brush().thickness() * scale).max(1.0));
        glyph.set_brush(brush);
        self.execute(&mut target, &glyph.draw_commands());
        target
    }
}

/// A fully transparent raster.
pub fn new_raster(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Source-over blend of a straight-alpha color onto one pixel.
pub fn blend_over(dst: &mut image::Rgba<u8>, src: Rgba) {
    let sa = src.a.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let [dr, dg, db, da] = dst.0;
    let da = da as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: f32, d: u8| {
        let d = d as f32 / 255.0;
        (s.clamp(0.0, 1.0) * sa + d * da * (1.0 - sa)) / out_a
    };
    let out = Rgba::new(mix(src.r, dr), mix(src.g, dg), mix(src.b, db), out_a);
    dst.0 = out.to_rgba8();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::Brush;
    use crate::node::NodeKind;
    use crate::path::GestureState;

    /// Paints the whole bounding box of each command; enough to check the
    /// default trait methods.
    struct BoxFill;

    impl RenderBackend for BoxFill {
        fn execute(&mut self, target: &mut RgbaImage, commands: &[DrawCommand<'_>]) {
            for command in commands {
                let (rect, color) = match command {
                    DrawCommand::Path {
                        instructions,
                        brush,
                        ..
                    } => (
                        crate::path::instruction_bounds(instructions).unwrap_or(Rect::ZERO),
                        brush.stroke_color(),
                    ),
                    DrawCommand::Ellipse { rect, brush, .. } => (*rect, brush.stroke_color()),
                    DrawCommand::Image(_) => continue,
                };
                for y in rect.y0 as u32..=rect.y1 as u32 {
                    for x in rect.x0 as u32..=rect.x1 as u32 {
                        if let Some(p) = target.get_pixel_mut_checked(x, y) {
                            blend_over(p, color);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_blend_over_opaque_and_half() {
        let mut px = image::Rgba([0, 0, 255, 255]);
        blend_over(&mut px, Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(px.0, [255, 0, 0, 255]);

        let mut px = image::Rgba([0, 0, 0, 0]);
        blend_over(&mut px, Rgba::new(1.0, 1.0, 1.0, 0.5));
        assert_eq!(px.0, [255, 255, 255, 128]);
    }

    #[test]
    fn test_composite_applies_opacity() {
        let mut a = new_raster(2, 2);
        a.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let mut b = new_raster(2, 2);
        b.put_pixel(0, 0, image::Rgba([0, 0, 255, 255]));
        b.put_pixel(1, 1, image::Rgba([0, 0, 255, 255]));

        let out = BoxFill.composite_rasters(2, 2, &[(&a, 1.0), (&b, 0.0)]);
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_sample_bounds() {
        let mut raster = new_raster(4, 4);
        raster.put_pixel(2, 3, image::Rgba([0, 255, 0, 255]));
        let backend = BoxFill;
        assert_eq!(
            backend.sample(&raster, Point::new(2.5, 3.9)),
            Some(Rgba::new(0.0, 1.0, 0.0, 1.0))
        );
        assert_eq!(backend.sample(&raster, Point::new(4.0, 0.0)), None);
        assert_eq!(backend.sample(&raster, Point::new(-1.0, 0.0)), None);
    }

    #[test]
    fn test_glyph_fits_node() {
        let mut node = Node::new(NodeKind::Rectangle, Brush::default());
        let a = Point::new(500.0, 500.0);
        node.set_initial_point(a);
        node.move_gesture(&GestureState::begin(a), Point::new(900.0, 700.0), 1.0);

        let glyph = BoxFill.rasterize_glyph(&node, 32);
        assert_eq!(glyph.dimensions(), (32, 32));
        assert!(glyph.pixels().any(|p| p.0[3] > 0));
        assert_eq!(glyph.get_pixel(0, 0).0[3], 0);
    }
}
