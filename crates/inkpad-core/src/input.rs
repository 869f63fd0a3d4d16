//! Pointer input delivered by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Identifies one pointer (mouse, finger, pen) for the lifetime of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub u64);

/// Pointer event type.
///
/// Hosts deliver `Begin`, any number of `Move`, then `End` or `Cancel` for a
/// given pointer. Only one pointer may drive a gesture at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Begin { pointer: PointerId, position: Point },
    Move { pointer: PointerId, position: Point },
    End { pointer: PointerId },
    Cancel { pointer: PointerId },
}

impl PointerEvent {
    pub fn pointer(&self) -> PointerId {
        match *self {
            PointerEvent::Begin { pointer, .. }
            | PointerEvent::Move { pointer, .. }
            | PointerEvent::End { pointer }
            | PointerEvent::Cancel { pointer } => pointer,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match *self {
            PointerEvent::Begin { position, .. } | PointerEvent::Move { position, .. } => Some(position),
            PointerEvent::End { .. } | PointerEvent::Cancel { .. } => None,
        }
    }
}
