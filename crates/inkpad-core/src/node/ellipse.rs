//! Ellipses. Geometry is the bounding box alone; there are no instructions.

use super::{KindBehavior, Node};
use crate::geometry::{distance, rect_from_corners};
use crate::path::GestureState;
use kurbo::{Point, Rect};

pub(super) struct Ellipse;

impl KindBehavior for Ellipse {
    fn move_gesture(
        &self,
        node: &mut Node,
        _gesture: &GestureState,
        _to: Point,
        _draw_distance: f64,
    ) -> Option<Rect> {
        let t = node.brush().thickness();
        Some(self.bounds(node).inflate(t, t))
    }

    /// Circumscribed-circle test: a point hits when it lies within half the
    /// box width of the box center. Callers rely on the looser radius, so
    /// this is not a true ellipse membership test.
    fn contains(&self, node: &Node, point: Point) -> bool {
        let bounds = node.bounding_box();
        distance(point, bounds.center()) <= bounds.width() / 2.0
    }

    fn bounds(&self, node: &Node) -> Rect {
        rect_from_corners(node.first_point(), node.last_point())
    }
}

#[cfg(test)]
mod tests {
    use crate::brush::Brush;
    use crate::node::{Node, NodeKind};
    use crate::path::GestureState;
    use kurbo::Point;

    #[test]
    fn test_circumscribed_circle_hit() {
        let mut node = Node::new(NodeKind::Ellipse, Brush::default());
        let a = Point::new(0.0, 0.0);
        node.set_initial_point(a);
        node.move_gesture(&GestureState::begin(a), Point::new(100.0, 20.0), 1.0);

        assert!(node.contains(Point::new(50.0, 10.0)));
        // Outside the ellipse but inside the circle of radius width/2.
        assert!(node.contains(Point::new(50.0, 50.0)));
        assert!(!node.contains(Point::new(50.0, 61.0)));
    }
}
