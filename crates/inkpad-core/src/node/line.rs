//! Straight lines.

use super::{KindBehavior, Node, stroke_contains};
use crate::path::{GestureState, line_instructions};
use kurbo::{Point, Rect};

pub(super) struct Line;

impl KindBehavior for Line {
    fn move_gesture(
        &self,
        node: &mut Node,
        gesture: &GestureState,
        to: Point,
        _draw_distance: f64,
    ) -> Option<Rect> {
        *node.instructions_mut() = line_instructions(gesture.first, to);
        let t = node.brush().thickness();
        crate::path::instruction_bounds(node.instructions()).map(|r| r.inflate(t, t))
    }

    fn contains(&self, node: &Node, point: Point) -> bool {
        stroke_contains(node, point, Some((node.first_point(), node.last_point())))
    }
}

#[cfg(test)]
mod tests {
    use crate::brush::{Brush, Rgba};
    use crate::node::{Node, NodeKind};
    use crate::path::GestureState;
    use kurbo::Point;

    #[test]
    fn test_rebuilt_on_every_move() {
        let mut node = Node::new(NodeKind::Line, Brush::new(Rgba::BLACK, 1.0));
        let start = Point::new(0.0, 0.0);
        let gesture = GestureState::begin(start);
        node.set_initial_point(start);
        node.move_gesture(&gesture, Point::new(10.0, 10.0), 1.0);
        node.move_gesture(&gesture, Point::new(20.0, 0.0), 1.0);
        assert_eq!(node.instructions().len(), 2);
        assert_eq!(node.to_svg_path_data(), "M 0.0 0.0 L 20.0 0.0");
    }

    #[test]
    fn test_hit_test() {
        let mut node = Node::new(NodeKind::Line, Brush::new(Rgba::BLACK, 1.0));
        let start = Point::new(0.0, 0.0);
        let gesture = GestureState::begin(start);
        node.set_initial_point(start);
        node.move_gesture(&gesture, Point::new(10.0, 10.0), 1.0);
        assert!(node.contains(Point::new(5.0, 5.0)));
        assert!(node.contains(Point::new(6.0, 5.0)));
        assert!(!node.contains(Point::new(8.0, 2.0)));
    }
}
