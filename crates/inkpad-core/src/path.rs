//! Path instructions and the per-tool segment builder.
//!
//! A node's outline is an ordered list of [`PathInstruction`]s. While a
//! gesture is live the builder either appends to that list (freehand) or
//! rebuilds it from the gesture's first and current points (line, rectangle,
//! selection).

use crate::geometry::{bounding_rect, midpoint, rect_from_corners};
use crate::serialize::DecodeError;
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One drawing command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathInstruction {
    MoveTo(Point),
    LineTo(Point),
    QuadCurveTo {
        end: Point,
        control: Point,
    },
    CubicCurveTo {
        end: Point,
        control1: Point,
        control2: Point,
    },
    Close,
}

impl PathInstruction {
    /// Integer tag used by the persisted format.
    pub fn type_index(&self) -> i64 {
        match self {
            PathInstruction::MoveTo(_) => 0,
            PathInstruction::LineTo(_) => 1,
            PathInstruction::QuadCurveTo { .. } => 2,
            PathInstruction::CubicCurveTo { .. } => 3,
            PathInstruction::Close => 4,
        }
    }

    fn expected_points(type_index: i64) -> Option<usize> {
        match type_index {
            0 | 1 => Some(1),
            2 => Some(2),
            3 => Some(3),
            4 => Some(0),
            _ => None,
        }
    }

    /// Points referenced by this instruction, end point first, then controls.
    pub fn points(&self) -> Vec<Point> {
        match *self {
            PathInstruction::MoveTo(p) | PathInstruction::LineTo(p) => vec![p],
            PathInstruction::QuadCurveTo { end, control } => vec![end, control],
            PathInstruction::CubicCurveTo {
                end,
                control1,
                control2,
            } => vec![end, control1, control2],
            PathInstruction::Close => Vec::new(),
        }
    }

    /// Where the pen is after this instruction (`None` for `Close`).
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            PathInstruction::MoveTo(p) | PathInstruction::LineTo(p) => Some(p),
            PathInstruction::QuadCurveTo { end, .. } | PathInstruction::CubicCurveTo { end, .. } => {
                Some(end)
            }
            PathInstruction::Close => None,
        }
    }

    /// Rebuild an instruction from its tag and point list.
    ///
    /// The point count must match the tag exactly.
    pub fn from_parts(type_index: i64, points: &[Point]) -> Result<Self, DecodeError> {
        let expected = Self::expected_points(type_index)
            .ok_or(DecodeError::UnknownInstruction(type_index))?;
        if points.len() != expected {
            return Err(DecodeError::PointCount {
                instruction: type_index,
                expected,
                found: points.len(),
            });
        }
        Ok(match type_index {
            0 => PathInstruction::MoveTo(points[0]),
            1 => PathInstruction::LineTo(points[0]),
            2 => PathInstruction::QuadCurveTo {
                end: points[0],
                control: points[1],
            },
            3 => PathInstruction::CubicCurveTo {
                end: points[0],
                control1: points[1],
                control2: points[2],
            },
            _ => PathInstruction::Close,
        })
    }

    /// Apply `f` to every point of the instruction.
    pub fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        match self {
            PathInstruction::MoveTo(p) | PathInstruction::LineTo(p) => *p = f(*p),
            PathInstruction::QuadCurveTo { end, control } => {
                *end = f(*end);
                *control = f(*control);
            }
            PathInstruction::CubicCurveTo {
                end,
                control1,
                control2,
            } => {
                *end = f(*end);
                *control1 = f(*control1);
                *control2 = f(*control2);
            }
            PathInstruction::Close => {}
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.map_points(|p| p + delta);
    }

    fn write_svg(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = match *self {
            PathInstruction::MoveTo(p) => write!(out, "M {:.1} {:.1}", p.x, p.y),
            PathInstruction::LineTo(p) => write!(out, "L {:.1} {:.1}", p.x, p.y),
            PathInstruction::QuadCurveTo { end, control } => write!(
                out,
                "Q {:.1} {:.1} {:.1} {:.1}",
                control.x, control.y, end.x, end.y
            ),
            PathInstruction::CubicCurveTo {
                end,
                control1,
                control2,
            } => write!(
                out,
                "C {:.1} {:.1} {:.1} {:.1} {:.1} {:.1}",
                control1.x, control1.y, control2.x, control2.y, end.x, end.y
            ),
            PathInstruction::Close => write!(out, "Z"),
        };
    }
}

/// SVG path data, one command per instruction, one decimal place.
pub fn svg_path_data(instructions: &[PathInstruction]) -> String {
    let mut out = String::new();
    for (i, instruction) in instructions.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        instruction.write_svg(&mut out);
    }
    out
}

/// Convert instructions into a kurbo path for rendering backends.
pub fn to_bez_path(instructions: &[PathInstruction]) -> BezPath {
    let mut path = BezPath::new();
    for instruction in instructions {
        match *instruction {
            PathInstruction::MoveTo(p) => path.move_to(p),
            PathInstruction::LineTo(p) => path.line_to(p),
            PathInstruction::QuadCurveTo { end, control } => path.quad_to(control, end),
            PathInstruction::CubicCurveTo {
                end,
                control1,
                control2,
            } => path.curve_to(control1, control2, end),
            PathInstruction::Close => path.close_path(),
        }
    }
    path
}

/// Bounding box of every point the instructions reference.
pub fn instruction_bounds(instructions: &[PathInstruction]) -> Option<Rect> {
    bounding_rect(instructions.iter().flat_map(|i| i.points()))
}

/// Pointer history for a live gesture.
///
/// Threaded explicitly through the scene's stroke calls instead of being
/// attached to host input objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    /// Where the gesture began.
    pub first: Point,
    /// Most recent sample.
    pub last: Point,
    /// Sample before `last`.
    pub last_last: Point,
}

impl GestureState {
    pub fn begin(point: Point) -> Self {
        Self {
            first: point,
            last: point,
            last_last: point,
        }
    }

    /// Shift the sample history after `point` has been consumed.
    pub fn advance(&mut self, point: Point) {
        self.last_last = self.last;
        self.last = point;
    }
}

/// Smoothed freehand segment for a new sample.
///
/// Returns the quadratic curve from the previous midpoint to the new one,
/// controlled by the previous sample, plus the dirty rectangle covering the
/// segment outset by `draw_distance * thickness` on each axis.
pub fn freehand_segment(
    gesture: &GestureState,
    current: Point,
    thickness: f64,
    draw_distance: f64,
) -> (PathInstruction, Rect) {
    let mid1 = midpoint(gesture.last_last, gesture.last);
    let mid2 = midpoint(current, gesture.last);
    let instruction = PathInstruction::QuadCurveTo {
        end: mid2,
        control: gesture.last,
    };
    let outset = draw_distance * thickness;
    let dirty = bounding_rect([mid1, mid2, gesture.last])
        .unwrap_or(Rect::ZERO)
        .inflate(outset, outset);
    (instruction, dirty)
}

/// Straight line from the gesture's first point to `current`.
pub fn line_instructions(first: Point, current: Point) -> Vec<PathInstruction> {
    vec![PathInstruction::MoveTo(first), PathInstruction::LineTo(current)]
}

/// Closed axis-aligned rectangle spanned by two opposing corners.
pub fn rectangle_instructions(first: Point, current: Point) -> Vec<PathInstruction> {
    let r = rect_from_corners(first, current);
    vec![
        PathInstruction::MoveTo(Point::new(r.x0, r.y0)),
        PathInstruction::LineTo(Point::new(r.x1, r.y0)),
        PathInstruction::LineTo(Point::new(r.x1, r.y1)),
        PathInstruction::LineTo(Point::new(r.x0, r.y1)),
        PathInstruction::Close,
    ]
}
