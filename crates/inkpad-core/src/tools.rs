//! Drawing tools.

use crate::node::NodeKind;
use serde::{Deserialize, Serialize};

/// Available tools. Each one produces nodes of a single kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Freehand,
    Eraser,
    Line,
    Rectangle,
    Ellipse,
    Selection,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Freehand,
        ToolKind::Eraser,
        ToolKind::Line,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Selection,
    ];

    /// Kind of node this tool draws.
    pub fn node_kind(self) -> NodeKind {
        match self {
            ToolKind::Freehand => NodeKind::Freehand,
            ToolKind::Eraser => NodeKind::Eraser,
            ToolKind::Line => NodeKind::Line,
            ToolKind::Rectangle => NodeKind::Rectangle,
            ToolKind::Ellipse => NodeKind::Ellipse,
            ToolKind::Selection => NodeKind::Selection,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Freehand => "Freehand",
            ToolKind::Eraser => "Eraser",
            ToolKind::Line => "Line",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Ellipse => "Ellipse",
            ToolKind::Selection => "Selection",
        }
    }
}
