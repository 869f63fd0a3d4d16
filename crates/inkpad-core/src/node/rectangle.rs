//! Axis-aligned rectangles.

use super::{KindBehavior, Node};
use crate::geometry::rect_contains;
use crate::path::{GestureState, rectangle_instructions};
use kurbo::{Point, Rect};

pub(super) struct Rectangle;

impl KindBehavior for Rectangle {
    fn move_gesture(
        &self,
        node: &mut Node,
        gesture: &GestureState,
        to: Point,
        _draw_distance: f64,
    ) -> Option<Rect> {
        *node.instructions_mut() = rectangle_instructions(gesture.first, to);
        let t = node.brush().thickness();
        crate::path::instruction_bounds(node.instructions()).map(|r| r.inflate(t, t))
    }

    fn contains(&self, node: &Node, point: Point) -> bool {
        rect_contains(node.bounding_box(), point)
    }
}

#[cfg(test)]
mod tests {
    use crate::brush::Brush;
    use crate::node::{Node, NodeKind};
    use crate::path::GestureState;
    use kurbo::{Point, Rect};

    fn rectangle(a: Point, b: Point) -> Node {
        let mut node = Node::new(NodeKind::Rectangle, Brush::default());
        node.set_initial_point(a);
        node.move_gesture(&GestureState::begin(a), b, 1.0);
        node
    }

    #[test]
    fn test_contains() {
        let node = rectangle(Point::new(10.0, 10.0), Point::new(50.0, 40.0));
        assert!(node.contains(Point::new(20.0, 20.0)));
        assert!(!node.contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_dragged_backwards() {
        let node = rectangle(Point::new(50.0, 40.0), Point::new(10.0, 10.0));
        assert_eq!(node.bounding_box(), Rect::new(10.0, 10.0, 50.0, 40.0));
        assert!(node.contains(Point::new(20.0, 20.0)));
    }
}
