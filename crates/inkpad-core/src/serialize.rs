//! Persisted node format.
//!
//! Nodes are stored as flat records with integer tags for enums and
//! 4-float arrays for colors. The quadruple `[-1, -1, -1, -1]` stands for
//! "no color" and is distinct from transparent black.

use crate::brush::{Brush, LineCap, LineJoin, Rgba};
use crate::node::{Node, NodeKind};
use crate::path::PathInstruction;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Color value meaning "unset".
pub const NO_COLOR: [f32; 4] = [-1.0, -1.0, -1.0, -1.0];

/// Errors raised while decoding persisted data.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(i64),
    #[error("Unknown path instruction: {0}")]
    UnknownInstruction(i64),
    #[error("Instruction {instruction} expects {expected} points, found {found}")]
    PointCount {
        instruction: i64,
        expected: usize,
        found: usize,
    },
    #[error("Unknown line cap: {0}")]
    UnknownCap(i64),
    #[error("Unknown line join: {0}")]
    UnknownJoin(i64),
    #[error("Color components must lie in [0, 1]: {0:?}")]
    InvalidColor([f32; 4]),
}

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for PointRecord {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<PointRecord> for Point {
    fn from(p: PointRecord) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectRecord {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<Rect> for RectRecord {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x0,
            y: r.y0,
            w: r.width(),
            h: r.height(),
        }
    }
}

impl From<RectRecord> for Rect {
    fn from(r: RectRecord) -> Self {
        Rect::new(r.x, r.y, r.x + r.w, r.y + r.h)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushRecord {
    pub color: [f32; 4],
    pub thickness: f64,
    pub opacity: f32,
    pub miter: f32,
    pub cap: i64,
    pub join: i64,
}

impl From<&Brush> for BrushRecord {
    fn from(b: &Brush) -> Self {
        Self {
            color: b.color().to_array(),
            thickness: b.thickness(),
            opacity: b.opacity(),
            miter: b.miter(),
            cap: b.cap() as i64,
            join: b.join() as i64,
        }
    }
}

impl BrushRecord {
    pub fn decode(&self) -> DecodeResult<Brush> {
        let cap = LineCap::from_index(self.cap).ok_or(DecodeError::UnknownCap(self.cap))?;
        let join = LineJoin::from_index(self.join).ok_or(DecodeError::UnknownJoin(self.join))?;
        Ok(Brush::new(decode_color(self.color)?, self.thickness)
            .with_opacity(self.opacity)
            .with_miter(self.miter)
            .with_cap(cap)
            .with_join(join))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionRecord {
    #[serde(rename = "type")]
    pub kind: i64,
    pub points: Vec<PointRecord>,
}

impl From<&PathInstruction> for InstructionRecord {
    fn from(i: &PathInstruction) -> Self {
        Self {
            kind: i.type_index(),
            points: i.points().into_iter().map(PointRecord::from).collect(),
        }
    }
}

impl InstructionRecord {
    pub fn decode(&self) -> DecodeResult<PathInstruction> {
        let points: Vec<Point> = self.points.iter().copied().map(Point::from).collect();
        PathInstruction::from_parts(self.kind, &points)
    }
}

/// One persisted node.
///
/// `bounding_box` is written for consumers of the format; decoding derives
/// the box from the geometry again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub kind: i64,
    pub brush: BrushRecord,
    pub first_point: PointRecord,
    pub last_point: PointRecord,
    pub bounding_box: RectRecord,
    pub movable: bool,
    pub fill_color: [f32; 4],
    pub instructions: Vec<InstructionRecord>,
}

fn decode_color(c: [f32; 4]) -> DecodeResult<Rgba> {
    let color = Rgba::from_array(c);
    if color.is_valid() {
        Ok(color)
    } else {
        Err(DecodeError::InvalidColor(c))
    }
}

fn decode_optional_color(c: [f32; 4]) -> DecodeResult<Option<Rgba>> {
    if c == NO_COLOR {
        Ok(None)
    } else {
        decode_color(c).map(Some)
    }
}

impl Node {
    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            kind: self.kind().index(),
            brush: BrushRecord::from(self.brush()),
            first_point: self.first_point().into(),
            last_point: self.last_point().into(),
            bounding_box: self.bounding_box().into(),
            movable: self.is_movable(),
            fill_color: self.fill_color().map(Rgba::to_array).unwrap_or(NO_COLOR),
            instructions: self.instructions().iter().map(InstructionRecord::from).collect(),
        }
    }

    /// Rebuild a node from its record. The node receives a fresh id.
    ///
    /// Nothing is built unless the whole record decodes.
    pub fn from_record(record: &NodeRecord) -> DecodeResult<Node> {
        let kind = NodeKind::from_index(record.kind).ok_or(DecodeError::UnknownNodeKind(record.kind))?;
        let brush = record.brush.decode()?;
        let instructions = record
            .instructions
            .iter()
            .map(InstructionRecord::decode)
            .collect::<DecodeResult<Vec<_>>>()?;
        let fill = decode_optional_color(record.fill_color)?;
        Ok(Node::from_parts(
            kind,
            brush,
            instructions,
            (record.first_point.into(), record.last_point.into()),
            fill,
            record.movable,
        ))
    }

    /// Serialize the node to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record())
    }

    /// Deserialize a node from JSON.
    pub fn from_json(json: &str) -> DecodeResult<Node> {
        let record: NodeRecord = serde_json::from_str(json)?;
        Node::from_record(&record).inspect_err(|e| log::warn!("Rejected node record: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::GestureState;

    fn build(kind: NodeKind, points: &[Point]) -> Node {
        let brush = Brush::new(Rgba::new(0.25, 0.5, 0.75, 1.0), 3.5)
            .with_opacity(0.5)
            .with_miter(0.25)
            .with_cap(LineCap::Square)
            .with_join(LineJoin::Bevel);
        let mut node = Node::new(kind, brush);
        let mut gesture = GestureState::begin(points[0]);
        node.set_initial_point(points[0]);
        for &p in &points[1..] {
            node.move_gesture(&gesture, p, 1.0);
            gesture.advance(p);
        }
        node
    }

    fn same_content(a: &Node, b: &Node) {
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.brush(), b.brush());
        assert_eq!(a.instructions(), b.instructions());
        assert_eq!(a.first_point(), b.first_point());
        assert_eq!(a.last_point(), b.last_point());
        assert_eq!(a.bounding_box(), b.bounding_box());
        assert_eq!(a.fill_color(), b.fill_color());
        assert_eq!(a.is_movable(), b.is_movable());
    }

    #[test]
    fn test_roundtrip_every_kind() {
        let points = [
            Point::new(1.1, 2.2),
            Point::new(10.3, -4.7),
            Point::new(33.3, 17.01),
            Point::new(0.1, 0.2),
        ];
        for kind in [
            NodeKind::Freehand,
            NodeKind::Line,
            NodeKind::Rectangle,
            NodeKind::Ellipse,
            NodeKind::Selection,
            NodeKind::Eraser,
        ] {
            let mut node = build(kind, &points);
            if kind == NodeKind::Rectangle {
                node.set_fill_color(Some(Rgba::new(0.0, 0.0, 0.0, 0.0)));
            }
            node.set_movable(kind != NodeKind::Selection);

            let json = node.to_json().unwrap();
            let decoded = Node::from_json(&json).unwrap();
            same_content(&node, &decoded);
            assert_ne!(decoded.id(), node.id());
        }
    }

    #[test]
    fn test_color_sentinel() {
        let mut node = build(NodeKind::Rectangle, &[Point::new(0.0, 0.0), Point::new(4.0, 4.0)]);
        assert_eq!(node.to_record().fill_color, NO_COLOR);
        assert_eq!(Node::from_record(&node.to_record()).unwrap().fill_color(), None);

        // Transparent black is a real color, not "unset".
        node.set_fill_color(Some(Rgba::TRANSPARENT));
        let record = node.to_record();
        assert_eq!(record.fill_color, [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            Node::from_record(&record).unwrap().fill_color(),
            Some(Rgba::TRANSPARENT)
        );
    }

    #[test]
    fn test_wire_field_names() {
        let node = build(NodeKind::Line, &[Point::new(0.0, 0.0), Point::new(4.0, 2.0)]);
        let value: serde_json::Value = serde_json::from_str(&node.to_json().unwrap()).unwrap();
        assert_eq!(value["kind"], 1);
        assert_eq!(value["boundingBox"]["w"], 4.0);
        assert_eq!(value["firstPoint"]["x"], 0.0);
        assert_eq!(value["instructions"][1]["type"], 1);
        assert_eq!(value["fillColor"][0], -1.0);
        assert_eq!(value["brush"]["cap"], 2);
    }

    #[test]
    fn test_malformed_instruction_rejected() {
        let node = build(NodeKind::Freehand, &[Point::new(0.0, 0.0), Point::new(4.0, 2.0)]);
        let mut record = node.to_record();
        record.instructions[1].points.pop();
        assert!(matches!(
            Node::from_record(&record),
            Err(DecodeError::PointCount {
                instruction: 2,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_unknown_tags_rejected() {
        let node = build(NodeKind::Line, &[Point::new(0.0, 0.0), Point::new(4.0, 2.0)]);
        let mut record = node.to_record();
        record.kind = 42;
        assert!(matches!(Node::from_record(&record), Err(DecodeError::UnknownNodeKind(42))));

        let mut record = node.to_record();
        record.brush.join = 7;
        assert!(matches!(Node::from_record(&record), Err(DecodeError::UnknownJoin(7))));

        let mut record = node.to_record();
        record.brush.color = [2.0, 0.0, 0.0, 1.0];
        assert!(matches!(Node::from_record(&record), Err(DecodeError::InvalidColor(_))));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(Node::from_json("{"), Err(DecodeError::Json(_))));
    }
}
