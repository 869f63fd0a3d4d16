//! Drawn nodes: one committed (or in-progress) shape.
//!
//! Every kind shares the same storage (brush copy, instruction list, first
//! and last point, bounding box). Kind-specific behaviour (gesture handling,
//! hit-testing, bounds derivation) lives in one module per kind and is
//! reached through [`behavior`].

mod ellipse;
mod freehand;
mod line;
mod rectangle;
mod selection;

use crate::brush::{Brush, Rgba};
use crate::geometry::{rasterize_line, rect_contains};
use crate::path::{GestureState, PathInstruction, svg_path_data, to_bez_path};
use crate::render::{BlendMode, DrawCommand, StrokePattern};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic node identifier. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Freehand,
    Line,
    Rectangle,
    Ellipse,
    Selection,
    /// Freehand geometry that clears pixels instead of painting them.
    Eraser,
}

impl NodeKind {
    /// Integer tag used by the persisted format.
    pub fn index(self) -> i64 {
        match self {
            NodeKind::Freehand => 0,
            NodeKind::Line => 1,
            NodeKind::Rectangle => 2,
            NodeKind::Ellipse => 3,
            NodeKind::Selection => 4,
            NodeKind::Eraser => 5,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(NodeKind::Freehand),
            1 => Some(NodeKind::Line),
            2 => Some(NodeKind::Rectangle),
            3 => Some(NodeKind::Ellipse),
            4 => Some(NodeKind::Selection),
            5 => Some(NodeKind::Eraser),
            _ => None,
        }
    }
}

/// Per-kind behaviour.
pub(crate) trait KindBehavior: Sync {
    /// Seed geometry when a gesture begins.
    fn set_initial_point(&self, _node: &mut Node, _point: Point) {}

    /// Extend or rebuild geometry for a new pointer sample. `node.last_point`
    /// has already been updated. Returns the area that needs repainting.
    fn move_gesture(
        &self,
        node: &mut Node,
        gesture: &GestureState,
        to: Point,
        draw_distance: f64,
    ) -> Option<Rect>;

    fn contains(&self, node: &Node, point: Point) -> bool;

    /// Recompute the bounding box from the node's geometry.
    fn bounds(&self, node: &Node) -> Rect {
        crate::path::instruction_bounds(&node.instructions).unwrap_or(Rect::from_points(
            node.first_point,
            node.first_point,
        ))
    }
}

/// Dispatch table from kind to behaviour.
pub(crate) fn behavior(kind: NodeKind) -> &'static dyn KindBehavior {
    match kind {
        NodeKind::Freehand | NodeKind::Eraser => &freehand::Freehand,
        NodeKind::Line => &line::Line,
        NodeKind::Rectangle => &rectangle::Rectangle,
        NodeKind::Ellipse => &ellipse::Ellipse,
        NodeKind::Selection => &selection::Selection,
    }
}

/// A drawn shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    kind: NodeKind,
    brush: Brush,
    instructions: Vec<PathInstruction>,
    first_point: Point,
    last_point: Point,
    bounding_box: Rect,
    fill_color: Option<Rgba>,
    movable: bool,
}

impl Node {
    /// Create an empty node of `kind` carrying a copy of `brush`.
    pub fn new(kind: NodeKind, brush: Brush) -> Self {
        Self {
            id: NodeId::next(),
            kind,
            brush,
            instructions: Vec::new(),
            first_point: Point::ZERO,
            last_point: Point::ZERO,
            bounding_box: Rect::ZERO,
            fill_color: None,
            movable: true,
        }
    }

    /// Reassemble a node from stored parts under a fresh id.
    ///
    /// The bounding box is derived from the geometry, never taken from
    /// storage, so it cannot come back stale.
    pub(crate) fn from_parts(
        kind: NodeKind,
        brush: Brush,
        instructions: Vec<PathInstruction>,
        (first_point, last_point): (Point, Point),
        fill_color: Option<Rgba>,
        movable: bool,
    ) -> Self {
        let mut node = Self {
            id: NodeId::next(),
            kind,
            brush,
            instructions,
            first_point,
            last_point,
            bounding_box: Rect::ZERO,
            fill_color,
            movable,
        };
        node.refresh_bounds();
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn instructions(&self) -> &[PathInstruction] {
        &self.instructions
    }

    pub fn first_point(&self) -> Point {
        self.first_point
    }

    pub fn last_point(&self) -> Point {
        self.last_point
    }

    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    pub fn fill_color(&self) -> Option<Rgba> {
        self.fill_color
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn set_movable(&mut self, movable: bool) {
        self.movable = movable;
    }

    /// Change the stroke color of this node's own brush copy.
    pub fn set_color(&mut self, color: Rgba) {
        self.brush.set_color(color);
    }

    pub fn set_fill_color(&mut self, fill: Option<Rgba>) {
        self.fill_color = fill;
    }

    /// Whether the node carries no drawable geometry. An ellipse has no
    /// instructions, so it is empty until its corners differ.
    pub fn is_empty(&self) -> bool {
        match self.kind {
            NodeKind::Ellipse => self.first_point == self.last_point,
            _ => self.instructions.is_empty(),
        }
    }

    /// Start a gesture at `point`.
    pub fn set_initial_point(&mut self, point: Point) {
        self.first_point = point;
        self.last_point = point;
        self.instructions.clear();
        behavior(self.kind).set_initial_point(self, point);
        self.refresh_bounds();
    }

    /// Feed a new pointer sample; returns the area to repaint.
    pub fn move_gesture(&mut self, gesture: &GestureState, to: Point, draw_distance: f64) -> Option<Rect> {
        self.last_point = to;
        let dirty = behavior(self.kind).move_gesture(self, gesture, to, draw_distance);
        self.refresh_bounds();
        dirty
    }

    /// Hit-test a point against this node.
    pub fn contains(&self, point: Point) -> bool {
        behavior(self.kind).contains(self, point)
    }

    /// Shift every coordinate of the node.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        let delta = Vec2::new(dx, dy);
        for instruction in &mut self.instructions {
            instruction.translate(delta);
        }
        self.first_point += delta;
        self.last_point += delta;
        self.refresh_bounds();
    }

    /// Apply an arbitrary point mapping (used for thumbnails).
    pub(crate) fn map_points(&mut self, f: impl Fn(Point) -> Point + Copy) {
        for instruction in &mut self.instructions {
            instruction.map_points(f);
        }
        self.first_point = f(self.first_point);
        self.last_point = f(self.last_point);
        self.refresh_bounds();
    }

    pub(crate) fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn to_svg_path_data(&self) -> String {
        svg_path_data(&self.instructions)
    }

    pub fn to_bez_path(&self) -> BezPath {
        to_bez_path(&self.instructions)
    }

    /// Copy that keeps the same id. Used for history records.
    pub fn snapshot(&self) -> Node {
        self.clone()
    }

    /// Copy that becomes a new shape with a fresh id. Used for paste and
    /// duplicate.
    pub fn duplicate(&self) -> Node {
        Node {
            id: NodeId::next(),
            ..self.clone()
        }
    }

    /// Drawing commands for this node, in paint order.
    pub fn draw_commands(&self) -> Vec<DrawCommand<'_>> {
        if self.is_empty() {
            return Vec::new();
        }
        let path = |blend, pattern| DrawCommand::Path {
            instructions: &self.instructions,
            brush: &self.brush,
            fill: self.fill_color,
            blend,
            pattern,
        };
        match self.kind {
            NodeKind::Freehand | NodeKind::Line | NodeKind::Rectangle => {
                vec![path(BlendMode::Normal, StrokePattern::Solid)]
            }
            NodeKind::Eraser => vec![path(BlendMode::Clear, StrokePattern::Solid)],
            NodeKind::Selection => vec![path(BlendMode::Normal, StrokePattern::Dashed)],
            NodeKind::Ellipse => vec![DrawCommand::Ellipse {
                rect: self.bounding_box,
                brush: &self.brush,
                fill: self.fill_color,
            }],
        }
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut Vec<PathInstruction> {
        &mut self.instructions
    }

    fn refresh_bounds(&mut self) {
        self.bounding_box = behavior(self.kind).bounds(self);
    }
}

/// Chebyshev hit-test along the pen path.
///
/// The pen path is the polyline through each instruction's end point, walked
/// with [`rasterize_line`]. `extra` adds one more rasterized segment.
pub(crate) fn stroke_contains(node: &Node, point: Point, extra: Option<(Point, Point)>) -> bool {
    let t = node.brush.thickness();
    // Rasterized points are rounded, so they may sit half a pixel outside.
    if !rect_contains(node.bounding_box.inflate(t + 1.0, t + 1.0), point) {
        return false;
    }
    let near = |q: &Point| (point.x - q.x).abs() <= t && (point.y - q.y).abs() <= t;

    let ends: Vec<Point> = node
        .instructions
        .iter()
        .filter_map(PathInstruction::end_point)
        .collect();
    let on_path = match ends.as_slice() {
        [] => false,
        [only] => rasterize_line(*only, *only).iter().any(near),
        _ => ends
            .windows(2)
            .any(|w| rasterize_line(w[0], w[1]).iter().any(near)),
    };
    on_path || extra.is_some_and(|(a, b)| rasterize_line(a, b).iter().any(near))
}
