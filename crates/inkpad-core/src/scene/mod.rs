//! The scene: layers, the active tool and brush, the gesture in progress,
//! and the undo history.

mod action;

pub use action::{LayerStack, SceneAction};

use crate::brush::{Brush, Rgba};
use crate::config::SceneConfig;
use crate::document::SceneDocument;
use crate::history::History;
use crate::input::{PointerEvent, PointerId};
use crate::layer::Layer;
use crate::node::{Node, NodeId};
use crate::path::GestureState;
use crate::render::RenderBackend;
use crate::serialize::DecodeResult;
use crate::storage::{Storage, StorageError, StorageResult};
use crate::tools::ToolKind;
use image::RgbaImage;
use kurbo::{Point, Rect, Vec2};
use uuid::Uuid;

/// Where a new layer goes relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Above,
    Below,
}

/// The full drawing state.
///
/// Every public edit records exactly one history entry. Index arguments
/// that are out of range clamp or do nothing; they never fail.
pub struct Scene {
    document_id: String,
    name: String,
    stack: LayerStack,
    tool: ToolKind,
    brush: Brush,
    pending: Option<Node>,
    gesture: Option<GestureState>,
    active_pointer: Option<PointerId>,
    history: History<SceneAction>,
    backend: Box<dyn RenderBackend>,
    config: SceneConfig,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("document_id", &self.document_id)
            .field("name", &self.name)
            .field("stack", &self.stack)
            .field("tool", &self.tool)
            .field("brush", &self.brush)
            .field("pending", &self.pending)
            .field("gesture", &self.gesture)
            .field("active_pointer", &self.active_pointer)
            .field("undo", &self.history.undo_len())
            .field("redo", &self.history.redo_len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create a scene with a single empty layer.
    pub fn new(config: SceneConfig, backend: Box<dyn RenderBackend>) -> Self {
        let layer = Layer::new(config.width, config.height).with_name("Layer 1");
        Self::with_layers(config, backend, vec![layer], 0)
    }

    fn with_layers(config: SceneConfig, backend: Box<dyn RenderBackend>, layers: Vec<Layer>, current: usize) -> Self {
        Self {
            document_id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            stack: LayerStack::new(layers, current),
            tool: config.tool,
            brush: config.brush,
            pending: None,
            gesture: None,
            active_pointer: None,
            history: History::new(config.undo_depth),
            backend,
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    // --- Tool and brush ---

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Change the tool. A gesture in progress keeps its original kind.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Replace the brush used for future strokes. Existing nodes keep theirs.
    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    // --- Layers ---

    pub fn layers(&self) -> &[Layer] {
        self.stack.layers()
    }

    pub fn layer_count(&self) -> usize {
        self.stack.len()
    }

    pub fn current_layer_index(&self) -> usize {
        self.stack.current_index()
    }

    pub fn current_layer(&self) -> Option<&Layer> {
        self.stack.current()
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.stack.layer(index)
    }

    /// Insert `layer` above or below the current layer and make it current.
    pub fn add_layer(&mut self, layer: Layer, position: Position) -> usize {
        let before = self.stack.current_index();
        let index = match (self.stack.is_empty(), position) {
            (true, _) => 0,
            (false, Position::Above) => before + 1,
            (false, Position::Below) => before,
        };
        let action = SceneAction::AddLayer {
            index,
            layer: layer.without_cache(),
            current: (before, index),
        };
        self.stack.insert_layer(index, layer);
        self.stack.set_current(index);
        log::debug!("Added layer at {}", index);
        self.history.record(action);
        index
    }

    /// Add an empty layer sized to the canvas above the current one.
    pub fn new_layer(&mut self) -> usize {
        let name = format!("Layer {}", self.stack.len() + 1);
        let layer = Layer::new(self.config.width, self.config.height).with_name(name);
        self.add_layer(layer, Position::Above)
    }

    /// Make `index` current, clamped to the last layer. Not recorded.
    pub fn switch_layer(&mut self, index: usize) -> usize {
        self.stack.set_current(index)
    }

    /// Move the layer at `from` to `to` (clamped). The current layer
    /// follows its content.
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        let len = self.stack.len();
        if from >= len {
            log::trace!("move_layer: index {} out of range", from);
            return false;
        }
        let to = to.min(len - 1);
        if from == to {
            return false;
        }
        let before = self.stack.current_index();
        let after = if before == from {
            to
        } else if from < before && before <= to {
            before - 1
        } else if to <= before && before < from {
            before + 1
        } else {
            before
        };
        self.stack.move_layer(from, to);
        self.stack.set_current(after);
        log::debug!("Moved layer {} to {}", from, to);
        self.history.record(SceneAction::MoveLayer {
            from,
            to,
            current: (before, after),
        });
        true
    }

    /// Swap two layers. The current layer follows its content.
    pub fn swap_layers(&mut self, a: usize, b: usize) -> bool {
        let len = self.stack.len();
        if a >= len || b >= len || a == b {
            log::trace!("swap_layers: ignoring ({}, {})", a, b);
            return false;
        }
        let before = self.stack.current_index();
        let after = match before {
            i if i == a => b,
            i if i == b => a,
            i => i,
        };
        self.stack.swap_layers(a, b);
        self.stack.set_current(after);
        log::debug!("Swapped layers {} and {}", a, b);
        self.history.record(SceneAction::SwapLayers { a, b, current: (before, after) });
        true
    }

    /// Remove the layer at `index`. Returns the removed layer.
    pub fn remove_layer(&mut self, index: usize) -> Option<Layer> {
        let before = self.stack.current_index();
        let Some(layer) = self.stack.remove_layer(index) else {
            log::trace!("remove_layer: index {} out of range", index);
            return None;
        };
        let after = self.stack.set_current(if before > index { before - 1 } else { before });
        log::debug!("Removed layer {}", index);
        self.history.record(SceneAction::RemoveLayer {
            index,
            layer: layer.without_cache(),
            current: (before, after),
        });
        Some(layer)
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> bool {
        let Some(layer) = self.stack.layer_mut(index) else {
            return false;
        };
        let before = layer.opacity();
        layer.set_opacity(opacity);
        let after = layer.opacity();
        if before == after {
            return false;
        }
        self.history.record(SceneAction::SetLayerOpacity { layer: index, before, after });
        true
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> bool {
        let Some(layer) = self.stack.layer_mut(index) else {
            return false;
        };
        let before = layer.is_visible();
        if before == visible {
            return false;
        }
        layer.set_visible(visible);
        self.history.record(SceneAction::SetLayerVisible { layer: index, before, after: visible });
        true
    }

    /// Lock or unlock a layer for drawing.
    ///
    /// This is a host-level setting outside the history: undo never changes
    /// it, and undoing a layer removal brings back the flag the layer had
    /// when it was removed.
    pub fn set_layer_allows_drawing(&mut self, index: usize, allows: bool) {
        if let Some(layer) = self.stack.layer_mut(index) {
            layer.set_allows_drawing(allows);
        }
    }

    /// Replace a layer's background image.
    ///
    /// Like the drawing lock, the background lives outside the history.
    /// A layer restored by undo carries the background it had when the
    /// entry was recorded.
    pub fn set_layer_background(&mut self, index: usize, background: Option<RgbaImage>) {
        if let Some(layer) = self.stack.layer_mut(index) {
            layer.set_background(background);
        }
    }

    // --- Strokes ---

    /// The node being drawn, if a gesture is active.
    pub fn pending(&self) -> Option<&Node> {
        self.pending.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a new node at `point` with the current tool and brush.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        let Some(layer) = self.stack.current() else {
            log::warn!("Ignoring stroke: scene has no layers");
            return false;
        };
        if !layer.is_visible() || !layer.allows_drawing() {
            log::warn!("Ignoring stroke on locked or hidden layer '{}'", layer.name());
            return false;
        }
        if self.pending.is_some() {
            log::debug!("Discarding unfinished stroke");
        }
        let mut node = Node::new(self.tool.node_kind(), self.brush);
        node.set_initial_point(point);
        self.pending = Some(node);
        self.gesture = Some(GestureState::begin(point));
        true
    }

    /// Feed a pointer sample to the pending node. Returns the area to
    /// repaint.
    pub fn continue_stroke(&mut self, point: Point) -> Option<Rect> {
        let (node, gesture) = self.pending.as_mut().zip(self.gesture.as_mut())?;
        let dirty = node.move_gesture(gesture, point, self.config.draw_distance);
        gesture.advance(point);
        log::trace!("Stroke sample at ({:.1}, {:.1})", point.x, point.y);
        dirty
    }

    /// Commit the pending node to the current layer.
    ///
    /// Nodes with no geometry are dropped and `None` is returned.
    pub fn end_stroke(&mut self) -> Option<NodeId> {
        self.gesture = None;
        let node = self.pending.take()?;
        if node.is_empty() {
            log::trace!("Dropping empty {:?} stroke", node.kind());
            return None;
        }
        self.commit(node, false)
    }

    /// Abandon the pending node.
    pub fn cancel_stroke(&mut self) {
        self.pending = None;
        self.gesture = None;
        self.active_pointer = None;
    }

    /// Drive strokes from host pointer events. Only one pointer may draw
    /// at a time; events from any other pointer are ignored.
    ///
    /// Returns true if the event was consumed.
    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        let pointer = event.pointer();
        match (self.active_pointer, event) {
            (Some(active), _) if active != pointer => {
                log::warn!("Ignoring pointer {:?} while {:?} is drawing", pointer, active);
                false
            }
            (_, PointerEvent::Begin { position, .. }) => {
                let started = self.begin_stroke(position);
                self.active_pointer = started.then_some(pointer);
                started
            }
            (Some(_), PointerEvent::Move { position, .. }) => {
                self.continue_stroke(position);
                true
            }
            (Some(_), PointerEvent::End { .. }) => {
                self.active_pointer = None;
                self.end_stroke();
                true
            }
            (Some(_), PointerEvent::Cancel { .. }) => {
                self.cancel_stroke();
                true
            }
            (None, _) => false,
        }
    }

    // --- Nodes ---

    fn commit(&mut self, node: Node, update: bool) -> Option<NodeId> {
        let layer_index = self.stack.current_index();
        let id = node.id();
        let Some(layer) = self.stack.current_mut() else {
            log::warn!("Dropping node {}: scene has no layers", id);
            return None;
        };
        let index = layer.len();
        let action = SceneAction::AddNode {
            layer: layer_index,
            index,
            node: node.snapshot(),
        };
        layer.add_node(node);
        if update {
            layer.redraw(self.backend.as_mut());
        }
        log::debug!("Committed node {} to layer {}", id, layer_index);
        self.history.record(action);
        Some(id)
    }

    /// Add a finished node to the current layer. With `update`, the layer
    /// is redrawn immediately.
    pub fn add_node(&mut self, node: Node, update: bool) -> Option<NodeId> {
        self.commit(node, update)
    }

    /// Replace every node on the current layer.
    pub fn set_nodes(&mut self, nodes: Vec<Node>, update: bool) {
        let layer_index = self.stack.current_index();
        let Some(layer) = self.stack.current_mut() else {
            return;
        };
        let after: Vec<Node> = nodes.iter().map(Node::snapshot).collect();
        let before = layer.set_nodes(nodes);
        if update {
            layer.redraw(self.backend.as_mut());
        }
        self.history.record(SceneAction::SetNodes { layer: layer_index, before, after });
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let (layer, _) = self.stack.locate(id)?;
        self.stack.layer(layer)?.node(id)
    }

    /// Topmost node on the current layer under `point`.
    pub fn hit_test(&self, point: Point) -> Option<&Node> {
        self.stack.current()?.hit_test(point)
    }

    /// Move a node. Nodes that are not movable are left alone.
    pub fn translate_node(&mut self, id: NodeId, dx: f64, dy: f64) -> bool {
        let Some((layer_index, _)) = self.stack.locate(id) else {
            return false;
        };
        let Some(node) = self.stack.layer_mut(layer_index).and_then(|l| l.node_mut(id)) else {
            return false;
        };
        if !node.is_movable() {
            log::trace!("Node {} is not movable", id);
            return false;
        }
        let before = node.snapshot();
        node.translate(dx, dy);
        let after = node.snapshot();
        self.history.record(SceneAction::Translate { layer: layer_index, before, after });
        true
    }

    /// Change a node's stroke color.
    pub fn recolor_node(&mut self, id: NodeId, color: Rgba) -> bool {
        let Some((layer_index, _)) = self.stack.locate(id) else {
            return false;
        };
        let Some(node) = self.stack.layer_mut(layer_index).and_then(|l| l.node_mut(id)) else {
            return false;
        };
        let before = node.brush().color();
        node.set_color(color);
        self.history.record(SceneAction::Recolor {
            layer: layer_index,
            id,
            before,
            after: color,
        });
        true
    }

    /// Change or remove a node's fill.
    pub fn fill_node(&mut self, id: NodeId, fill: Option<Rgba>) -> bool {
        let Some((layer_index, _)) = self.stack.locate(id) else {
            return false;
        };
        let Some(node) = self.stack.layer_mut(layer_index).and_then(|l| l.node_mut(id)) else {
            return false;
        };
        let before = node.fill_color();
        node.set_fill_color(fill);
        self.history.record(SceneAction::Fill {
            layer: layer_index,
            id,
            before,
            after: fill,
        });
        true
    }

    /// Remove a node from whichever layer holds it.
    pub fn delete_node(&mut self, id: NodeId, update: bool) -> Option<Node> {
        let (layer_index, _) = self.stack.locate(id)?;
        let layer = self.stack.layer_mut(layer_index)?;
        let (index, node) = layer.remove_node(id)?;
        if update {
            layer.redraw(self.backend.as_mut());
        }
        log::debug!("Deleted node {} from layer {}", id, layer_index);
        self.history.record(SceneAction::RemoveNode {
            layer: layer_index,
            index,
            node: node.snapshot(),
        });
        Some(node)
    }

    /// Copy a node under a fresh id, offset by `offset`, on top of its layer.
    pub fn duplicate_node(&mut self, id: NodeId, offset: Vec2) -> Option<NodeId> {
        let (layer_index, _) = self.stack.locate(id)?;
        let layer = self.stack.layer_mut(layer_index)?;
        let mut copy = layer.node(id)?.duplicate();
        copy.translate(offset.x, offset.y);
        let new_id = copy.id();
        let index = layer.len();
        self.history.record(SceneAction::AddNode {
            layer: layer_index,
            index,
            node: copy.snapshot(),
        });
        layer.add_node(copy);
        Some(new_id)
    }

    /// Remove every node from the current layer as one undoable step.
    pub fn clear_layer(&mut self) -> bool {
        let layer_index = self.stack.current_index();
        let Some(layer) = self.stack.current_mut() else {
            return false;
        };
        if layer.is_empty() {
            return false;
        }
        let nodes = layer.clear();
        log::debug!("Cleared {} nodes from layer {}", nodes.len(), layer_index);
        self.history.record(SceneAction::ClearLayer { layer: layer_index, nodes });
        true
    }

    /// Remove every node from every layer and forget the history.
    pub fn clear_canvas(&mut self) {
        self.cancel_stroke();
        for layer in self.stack.layers_mut() {
            layer.clear();
        }
        self.history.clear();
        log::debug!("Cleared canvas");
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        let label = self.history.peek_undo().map(SceneAction::label);
        let done = self.history.undo(&mut self.stack);
        if let Some(label) = label.filter(|_| done) {
            log::debug!("Undo: {}", label);
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let label = self.history.peek_redo().map(SceneAction::label);
        let done = self.history.redo(&mut self.stack);
        if let Some(label) = label.filter(|_| done) {
            log::debug!("Redo: {}", label);
        }
        done
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History<SceneAction> {
        &self.history
    }

    // --- Rendering ---

    /// Composite the current layer with the pending node on top.
    pub fn compose_layer(&mut self, from_cache: bool) -> Option<RgbaImage> {
        let layer = self.stack.current_mut()?;
        Some(layer.composite(self.backend.as_mut(), self.pending.as_ref(), from_cache))
    }

    /// Composite every visible layer, bottom to top, with the pending node
    /// drawn on the current layer.
    pub fn compose(&mut self) -> RgbaImage {
        let current = self.stack.current_index();
        let backend = self.backend.as_mut();
        let pending = self.pending.as_ref();
        let mut rasters = Vec::new();
        for (i, layer) in self.stack.layers_mut().iter_mut().enumerate() {
            if !layer.is_visible() {
                continue;
            }
            let top = if i == current { pending } else { None };
            rasters.push((layer.composite(backend, top, true), layer.opacity()));
        }
        let refs: Vec<(&RgbaImage, f32)> = rasters.iter().map(|(r, o)| (r, *o)).collect();
        self.backend.composite_rasters(self.config.width, self.config.height, &refs)
    }

    /// Sample the composed scene at `point` and make that the brush color.
    /// Existing nodes are not touched.
    pub fn eyedrop(&mut self, point: Point) -> Option<Rgba> {
        let raster = self.compose();
        let color = self.backend.sample(&raster, point)?;
        self.brush.set_color(color);
        Some(color)
    }

    /// Thumbnail of one node.
    pub fn glyph(&mut self, id: NodeId, size: u32) -> Option<RgbaImage> {
        let (layer, _) = self.stack.locate(id)?;
        let node = self.stack.layer(layer)?.node(id)?;
        Some(self.backend.rasterize_glyph(node, size))
    }

    // --- Persistence ---

    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            id: self.document_id.clone(),
            name: self.name.clone(),
            width: self.config.width,
            height: self.config.height,
            current_layer: self.stack.current_index(),
            layers: self.stack.layers().iter().map(Layer::to_record).collect(),
        }
    }

    /// Build a scene from a saved document. The document's canvas size
    /// overrides the one in `config`.
    ///
    /// Every node is decoded before anything is built, so a malformed
    /// document yields an error and no scene.
    pub fn from_document(
        document: &SceneDocument,
        mut config: SceneConfig,
        backend: Box<dyn RenderBackend>,
    ) -> DecodeResult<Scene> {
        config.width = document.width;
        config.height = document.height;
        let layers = document
            .layers
            .iter()
            .map(|record| Layer::from_record(record, document.width, document.height))
            .collect::<DecodeResult<Vec<_>>>()
            .inspect_err(|e| log::warn!("Rejected document {}: {}", document.id, e))?;
        let mut scene = Self::with_layers(config, backend, layers, document.current_layer);
        scene.document_id = document.id.clone();
        scene.name = document.name.clone();
        log::debug!("Loaded document {} ({} nodes)", document.id, document.node_count());
        Ok(scene)
    }

    /// Save the scene under its document id.
    pub async fn save_to(&self, storage: &dyn Storage) -> StorageResult<()> {
        let document = self.to_document();
        storage.save(&document.id, &document).await?;
        log::debug!("Saved document {}", document.id);
        Ok(())
    }

    /// Load the scene saved under `id`. A stored document that fails to
    /// decode is reported as a serialization error.
    pub async fn load_from(
        storage: &dyn Storage,
        id: &str,
        config: SceneConfig,
        backend: Box<dyn RenderBackend>,
    ) -> StorageResult<Scene> {
        let document = storage.load(id).await?;
        Self::from_document(&document, config, backend).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}
