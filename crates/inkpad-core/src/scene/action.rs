//! Undo entries and the layer stack they act on.

use crate::brush::Rgba;
use crate::history::Reversible;
use crate::layer::Layer;
use crate::node::{Node, NodeId};

/// Ordered layers (index 0 at the bottom) and the current-layer index.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
    current: usize,
}

impl LayerStack {
    pub fn new(layers: Vec<Layer>, current: usize) -> Self {
        let mut stack = Self { layers, current };
        stack.clamp_current();
        stack
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Layer> {
        self.layers.get(self.current)
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Layer> {
        self.layers.get_mut(self.current)
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub(crate) fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Find a node anywhere in the stack: `(layer index, node index)`.
    pub fn locate(&self, id: NodeId) -> Option<(usize, usize)> {
        self.layers
            .iter()
            .enumerate()
            .find_map(|(li, layer)| layer.index_of(id).map(|ni| (li, ni)))
    }

    /// Set the current index, clamped into range. Returns the index used.
    pub(crate) fn set_current(&mut self, index: usize) -> usize {
        self.current = index;
        self.clamp_current();
        self.current
    }

    fn clamp_current(&mut self) {
        let max = self.layers.len().saturating_sub(1);
        if self.current > max {
            log::trace!("Clamped layer index {} to {}", self.current, max);
            self.current = max;
        }
    }

    pub(crate) fn insert_layer(&mut self, index: usize, layer: Layer) {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
    }

    pub(crate) fn remove_layer(&mut self, index: usize) -> Option<Layer> {
        (index < self.layers.len()).then(|| self.layers.remove(index))
    }

    pub(crate) fn move_layer(&mut self, from: usize, to: usize) {
        if from >= self.layers.len() {
            return;
        }
        let layer = self.layers.remove(from);
        let to = to.min(self.layers.len());
        self.layers.insert(to, layer);
    }

    pub(crate) fn swap_layers(&mut self, a: usize, b: usize) {
        if a < self.layers.len() && b < self.layers.len() {
            self.layers.swap(a, b);
        }
    }

    fn with_node(&mut self, layer: usize, id: NodeId, f: impl FnOnce(&mut Node)) {
        match self.layers.get_mut(layer).and_then(|l| l.node_mut(id)) {
            Some(node) => f(node),
            None => log::trace!("Node {} not found on layer {}", id, layer),
        }
    }

    fn replace_node(&mut self, layer: usize, node: &Node) {
        let id = node.id();
        self.with_node(layer, id, |n| *n = node.snapshot());
    }
}

/// One undoable scene edit, stored as the data needed to redo and revert it.
///
/// `current` pairs are the current-layer index before and after the edit.
#[derive(Debug, Clone)]
pub enum SceneAction {
    AddNode { layer: usize, index: usize, node: Node },
    RemoveNode { layer: usize, index: usize, node: Node },
    Translate { layer: usize, before: Node, after: Node },
    Recolor { layer: usize, id: NodeId, before: Rgba, after: Rgba },
    Fill { layer: usize, id: NodeId, before: Option<Rgba>, after: Option<Rgba> },
    SetNodes { layer: usize, before: Vec<Node>, after: Vec<Node> },
    ClearLayer { layer: usize, nodes: Vec<Node> },
    AddLayer { index: usize, layer: Layer, current: (usize, usize) },
    RemoveLayer { index: usize, layer: Layer, current: (usize, usize) },
    MoveLayer { from: usize, to: usize, current: (usize, usize) },
    SwapLayers { a: usize, b: usize, current: (usize, usize) },
    SetLayerOpacity { layer: usize, before: f32, after: f32 },
    SetLayerVisible { layer: usize, before: bool, after: bool },
}

impl SceneAction {
    /// Short label for logs and menus.
    pub fn label(&self) -> &'static str {
        match self {
            SceneAction::AddNode { .. } => "Draw",
            SceneAction::RemoveNode { .. } => "Delete",
            SceneAction::Translate { .. } => "Move",
            SceneAction::Recolor { .. } => "Recolor",
            SceneAction::Fill { .. } => "Fill",
            SceneAction::SetNodes { .. } => "Replace Nodes",
            SceneAction::ClearLayer { .. } => "Clear Layer",
            SceneAction::AddLayer { .. } => "Add Layer",
            SceneAction::RemoveLayer { .. } => "Remove Layer",
            SceneAction::MoveLayer { .. } => "Move Layer",
            SceneAction::SwapLayers { .. } => "Swap Layers",
            SceneAction::SetLayerOpacity { .. } => "Layer Opacity",
            SceneAction::SetLayerVisible { .. } => "Layer Visibility",
        }
    }
}

fn set_nodes(stack: &mut LayerStack, layer: usize, nodes: &[Node]) {
    if let Some(l) = stack.layer_mut(layer) {
        l.set_nodes(nodes.iter().map(Node::snapshot).collect());
    }
}

impl Reversible for SceneAction {
    type Target = LayerStack;

    fn apply(&self, stack: &mut LayerStack) {
        match self {
            SceneAction::AddNode { layer, index, node } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.insert_node(*index, node.snapshot());
                }
            }
            SceneAction::RemoveNode { layer, node, .. } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.remove_node(node.id());
                }
            }
            SceneAction::Translate { layer, after, .. } => stack.replace_node(*layer, after),
            SceneAction::Recolor { layer, id, after, .. } => stack.with_node(*layer, *id, |n| n.set_color(*after)),
            SceneAction::Fill { layer, id, after, .. } => stack.with_node(*layer, *id, |n| n.set_fill_color(*after)),
            SceneAction::SetNodes { layer, after, .. } => set_nodes(stack, *layer, after),
            SceneAction::ClearLayer { layer, .. } => set_nodes(stack, *layer, &[]),
            SceneAction::AddLayer { index, layer, current } => {
                stack.insert_layer(*index, layer.clone());
                stack.set_current(current.1);
            }
            SceneAction::RemoveLayer { index, current, .. } => {
                stack.remove_layer(*index);
                stack.set_current(current.1);
            }
            SceneAction::MoveLayer { from, to, current } => {
                stack.move_layer(*from, *to);
                stack.set_current(current.1);
            }
            SceneAction::SwapLayers { a, b, current } => {
                stack.swap_layers(*a, *b);
                stack.set_current(current.1);
            }
            SceneAction::SetLayerOpacity { layer, after, .. } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.set_opacity(*after);
                }
            }
            SceneAction::SetLayerVisible { layer, after, .. } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.set_visible(*after);
                }
            }
        }
    }

    fn revert(&self, stack: &mut LayerStack) {
        match self {
            SceneAction::AddNode { layer, node, .. } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.remove_node(node.id());
                }
            }
            SceneAction::RemoveNode { layer, index, node } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.insert_node(*index, node.snapshot());
                }
            }
            SceneAction::Translate { layer, before, .. } => stack.replace_node(*layer, before),
            SceneAction::Recolor { layer, id, before, .. } => stack.with_node(*layer, *id, |n| n.set_color(*before)),
            SceneAction::Fill { layer, id, before, .. } => stack.with_node(*layer, *id, |n| n.set_fill_color(*before)),
            SceneAction::SetNodes { layer, before, .. } => set_nodes(stack, *layer, before),
            SceneAction::ClearLayer { layer, nodes } => set_nodes(stack, *layer, nodes),
            SceneAction::AddLayer { index, current, .. } => {
                stack.remove_layer(*index);
                stack.set_current(current.0);
            }
            SceneAction::RemoveLayer { index, layer, current } => {
                stack.insert_layer(*index, layer.clone());
                stack.set_current(current.0);
            }
            SceneAction::MoveLayer { from, to, current } => {
                // The forward move clamped `to` already, so this is exact.
                stack.move_layer(*to, *from);
                stack.set_current(current.0);
            }
            SceneAction::SwapLayers { a, b, current } => {
                stack.swap_layers(*a, *b);
                stack.set_current(current.0);
            }
            SceneAction::SetLayerOpacity { layer, before, .. } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.set_opacity(*before);
                }
            }
            SceneAction::SetLayerVisible { layer, before, .. } => {
                if let Some(l) = stack.layer_mut(*layer) {
                    l.set_visible(*before);
                }
            }
        }
    }
}
