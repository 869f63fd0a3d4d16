//! Whole-scene persistence records.

use crate::layer::Layer;
use crate::node::Node;
use crate::serialize::{DecodeResult, NodeRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted layer. Backgrounds and caches are not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    pub name: String,
    pub visible: bool,
    pub allows_drawing: bool,
    pub opacity: f32,
    pub nodes: Vec<NodeRecord>,
}

/// A saved scene: layer stack plus canvas metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub current_layer: usize,
    pub layers: Vec<LayerRecord>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl SceneDocument {
    /// Create an empty document with a fresh id.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            width,
            height,
            current_layer: 0,
            layers: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.layers.iter().map(|l| l.nodes.len()).sum()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a document. Node records are only checked when the document is
    /// turned back into a scene.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Layer {
    pub fn to_record(&self) -> LayerRecord {
        LayerRecord {
            name: self.name().to_string(),
            visible: self.is_visible(),
            allows_drawing: self.allows_drawing(),
            opacity: self.opacity(),
            nodes: self.nodes().iter().map(Node::to_record).collect(),
        }
    }

    /// Rebuild a layer. Fails without side effects if any node is malformed.
    pub fn from_record(record: &LayerRecord, width: u32, height: u32) -> DecodeResult<Layer> {
        let nodes = record
            .nodes
            .iter()
            .map(Node::from_record)
            .collect::<DecodeResult<Vec<_>>>()?;
        let mut layer = Layer::new(width, height).with_name(record.name.clone());
        layer.set_visible(record.visible);
        layer.set_allows_drawing(record.allows_drawing);
        layer.set_opacity(record.opacity);
        layer.set_nodes(nodes);
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{Brush, Rgba};
    use crate::node::NodeKind;
    use crate::path::GestureState;
    use kurbo::Point;

    fn line(a: Point, b: Point) -> Node {
        let mut node = Node::new(NodeKind::Line, Brush::new(Rgba::BLACK, 2.0));
        node.set_initial_point(a);
        node.move_gesture(&GestureState::begin(a), b, 1.0);
        node
    }

    #[test]
    fn test_layer_record_round_trip() {
        let mut layer = Layer::new(64, 64).with_name("Ink");
        layer.set_opacity(0.5);
        layer.set_visible(false);
        layer.add_node(line(Point::new(1.0, 2.0), Point::new(30.0, 40.0)));

        let record = layer.to_record();
        let restored = Layer::from_record(&record, 64, 64).unwrap();
        assert_eq!(restored.name(), "Ink");
        assert_eq!(restored.opacity(), 0.5);
        assert!(!restored.is_visible());
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.to_record(), record);
    }

    #[test]
    fn test_document_json_round_trip() {
        let mut doc = SceneDocument::new(32, 16);
        doc.name = "Sketch".to_string();
        doc.layers.push(Layer::new(32, 16).to_record());

        let json = doc.to_json().unwrap();
        assert!(json.contains("\"currentLayer\""));
        assert!(json.contains("\"allowsDrawing\""));
        let loaded = SceneDocument::from_json(&json).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_malformed_node_rejects_layer() {
        let mut record = Layer::new(8, 8).to_record();
        let mut node = line(Point::new(0.0, 0.0), Point::new(4.0, 4.0)).to_record();
        node.instructions[1].points.clear();
        record.nodes.push(node);
        assert!(Layer::from_record(&record, 8, 8).is_err());
    }
}
