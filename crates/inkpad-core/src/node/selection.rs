//! Selection marquees. Drawn as a dashed rectangle, transparent to hit-tests.

use super::{KindBehavior, Node};
use crate::path::{GestureState, rectangle_instructions};
use kurbo::{Point, Rect};

pub(super) struct Selection;

impl KindBehavior for Selection {
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

    fn contains(&self, _node: &Node, _point: Point) -> bool {
        false
    }
}
