//! Freehand strokes (and erasers, which share the geometry).

use super::{KindBehavior, Node, stroke_contains};
use crate::path::{GestureState, PathInstruction, freehand_segment};
use kurbo::{Point, Rect};

pub(super) struct Freehand;

impl KindBehavior for Freehand {
    fn set_initial_point(&self, node: &mut Node, point: Point) {
        node.instructions_mut().push(PathInstruction::MoveTo(point));
    }

    fn move_gesture(
        &self,
        node: &mut Node,
        gesture: &GestureState,
        to: Point,
        draw_distance: f64,
    ) -> Option<Rect> {
        let (segment, dirty) = freehand_segment(gesture, to, node.brush().thickness(), draw_distance);
        node.instructions_mut().push(segment);
        Some(dirty)
    }

    fn contains(&self, node: &Node, point: Point) -> bool {
        // Erasers are never selectable.
        if node.kind() == super::NodeKind::Eraser {
            return false;
        }
        stroke_contains(node, point, None)
    }
}

#[cfg(test)]
mod tests {
    use crate::brush::{Brush, Rgba};
    use crate::node::{Node, NodeKind};
    use crate::path::{GestureState, PathInstruction};
    use kurbo::Point;

    fn stroke(kind: NodeKind) -> Node {
        let mut node = Node::new(kind, Brush::new(Rgba::BLACK, 2.0));
        let start = Point::new(0.0, 0.0);
        let mut gesture = GestureState::begin(start);
        node.set_initial_point(start);
        for p in [Point::new(20.0, 0.0), Point::new(40.0, 0.0), Point::new(60.0, 0.0)] {
            node.move_gesture(&gesture, p, 1.0);
            gesture.advance(p);
        }
        node
    }

    #[test]
    fn test_gesture_builds_smoothed_curve() {
        let node = stroke(NodeKind::Freehand);
        let instructions = node.instructions();
        assert_eq!(instructions[0], PathInstruction::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(instructions.len(), 4);
        // No straight segments between raw samples.
        assert!(
            instructions[1..]
                .iter()
                .all(|i| matches!(i, PathInstruction::QuadCurveTo { .. }))
        );
        assert_eq!(
            instructions[3],
            PathInstruction::QuadCurveTo {
                end: Point::new(50.0, 0.0),
                control: Point::new(40.0, 0.0),
            }
        );
    }

    #[test]
    fn test_hit_test_uses_thickness() {
        let node = stroke(NodeKind::Freehand);
        assert!(node.contains(Point::new(25.0, 0.0)));
        assert!(node.contains(Point::new(25.0, 2.0)));
        assert!(!node.contains(Point::new(25.0, 3.5)));
        assert!(!node.contains(Point::new(80.0, 0.0)));
    }

    #[test]
    fn test_eraser_never_hit() {
        let node = stroke(NodeKind::Eraser);
        assert!(!node.contains(Point::new(25.0, 0.0)));
    }
}
