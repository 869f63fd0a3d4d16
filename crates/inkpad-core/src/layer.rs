//! Layers: ordered node stacks with a cached composite raster.

use crate::node::{Node, NodeId, NodeKind};
use crate::render::{DrawCommand, RenderBackend, new_raster};
use image::RgbaImage;
use kurbo::Point;

/// An ordered stack of nodes drawn over an optional background image.
///
/// Node order is z-order: later nodes paint on top. The cached composite,
/// when present, is exactly the background followed by every node; any
/// structural change drops it.
#[derive(Clone)]
pub struct Layer {
    name: String,
    nodes: Vec<Node>,
    background: Option<RgbaImage>,
    cache: Option<RgbaImage>,
    visible: bool,
    allows_drawing: bool,
    opacity: f32,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("background", &self.background.as_ref().map(|b| b.dimensions()))
            .field("cached", &self.cache.is_some())
            .field("visible", &self.visible)
            .field("allows_drawing", &self.allows_drawing)
            .field("opacity", &self.opacity)
            .field("size", &(self.width, self.height))
            .finish()
    }
}

impl Layer {
    /// Create an empty, visible, drawable layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            name: "Layer".to_string(),
            nodes: Vec::new(),
            background: None,
            cache: None,
            visible: true,
            allows_drawing: true,
            opacity: 1.0,
            width,
            height,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn allows_drawing(&self) -> bool {
        self.allows_drawing
    }

    pub fn set_allows_drawing(&mut self, allows: bool) {
        self.allows_drawing = allows;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the layer opacity, clamped into `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Mutable access to a node. Drops the cache, since the caller may
    /// change geometry or style.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let node = self.nodes.iter_mut().find(|n| n.id() == id)?;
        self.cache = None;
        Some(node)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    /// Append a node on top.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.invalidate();
    }

    /// Insert a node at `index`, clamped to the end of the stack.
    pub fn insert_node(&mut self, index: usize, node: Node) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
        self.invalidate();
    }

    /// Remove a node, returning its former index and value.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(usize, Node)> {
        let index = self.index_of(id)?;
        let node = self.nodes.remove(index);
        self.invalidate();
        Some((index, node))
    }

    /// Replace every node, returning the previous list.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        let old = std::mem::replace(&mut self.nodes, nodes);
        self.invalidate();
        old
    }

    /// Remove every node, returning them.
    pub fn clear(&mut self) -> Vec<Node> {
        self.set_nodes(Vec::new())
    }

    pub fn background(&self) -> Option<&RgbaImage> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, background: Option<RgbaImage>) {
        self.background = background;
        self.invalidate();
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Copy of this layer without its cached raster.
    pub(crate) fn without_cache(&self) -> Layer {
        Layer {
            cache: None,
            ..self.clone()
        }
    }

    /// Full redraw: background, then every node in order. Stores the result
    /// as the new cache.
    pub fn redraw(&mut self, backend: &mut dyn RenderBackend) {
        let mut raster = new_raster(self.width, self.height);
        let mut commands = Vec::with_capacity(self.nodes.len() + 1);
        if let Some(background) = &self.background {
            commands.push(DrawCommand::Image(background));
        }
        for node in &self.nodes {
            commands.extend(node.draw_commands());
        }
        backend.execute(&mut raster, &commands);
        log::debug!("Redrew layer '{}' ({} nodes)", self.name, self.nodes.len());
        self.cache = Some(raster);
    }

    /// Composite this layer with an optional in-progress node on top.
    ///
    /// With `from_cache` and a valid cache, only the pending node is drawn
    /// over a copy of the cache (which already holds the background).
    /// Otherwise the layer is fully redrawn first. Both paths produce the
    /// same pixels.
    pub fn composite(
        &mut self,
        backend: &mut dyn RenderBackend,
        pending: Option<&Node>,
        from_cache: bool,
    ) -> RgbaImage {
        if !from_cache || self.cache.is_none() {
            self.redraw(backend);
        }
        let mut out = match &self.cache {
            Some(cache) => cache.clone(),
            None => new_raster(self.width, self.height),
        };
        if let Some(node) = pending {
            backend.execute(&mut out, &node.draw_commands());
        }
        out
    }

    /// Topmost node containing `point`. Erasers are never returned.
    pub fn hit_test(&self, point: Point) -> Option<&Node> {
        self.nodes
            .iter()
            .rev()
            .filter(|n| n.kind() != NodeKind::Eraser)
            .find(|n| n.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{Brush, Rgba};
    use crate::path::GestureState;
    use crate::render::blend_over;

    /// Counts executed commands and paints one marker pixel per command so
    /// results can be compared.
    #[derive(Default)]
    struct Counting {
        executed: usize,
    }

    impl RenderBackend for Counting {
        fn execute(&mut self, target: &mut RgbaImage, commands: &[DrawCommand<'_>]) {
            for command in commands {
                self.executed += 1;
                if let DrawCommand::Path { instructions, brush, .. } = command {
                    if let Some(p) = instructions.first().and_then(|i| i.end_point()) {
                        if let Some(px) = target.get_pixel_mut_checked(p.x as u32, p.y as u32) {
                            blend_over(px, brush.stroke_color());
                        }
                    }
                }
            }
        }
    }

    fn rect_node(a: Point, b: Point) -> Node {
        let mut node = Node::new(NodeKind::Rectangle, Brush::new(Rgba::BLACK, 1.0));
        node.set_initial_point(a);
        node.move_gesture(&GestureState::begin(a), b, 1.0);
        node
    }

    fn eraser_node(a: Point, b: Point) -> Node {
        let mut node = Node::new(NodeKind::Eraser, Brush::new(Rgba::BLACK, 5.0));
        let gesture = GestureState::begin(a);
        node.set_initial_point(a);
        node.move_gesture(&gesture, b, 1.0);
        node
    }

    #[test]
    fn test_structural_changes_invalidate() {
        let mut layer = Layer::new(16, 16);
        let mut backend = Counting::default();
        layer.redraw(&mut backend);
        assert!(layer.is_cached());

        let node = rect_node(Point::new(1.0, 1.0), Point::new(4.0, 4.0));
        let id = node.id();
        layer.add_node(node);
        assert!(!layer.is_cached());

        layer.redraw(&mut backend);
        layer.remove_node(id);
        assert!(!layer.is_cached());

        layer.redraw(&mut backend);
        layer.set_nodes(vec![rect_node(Point::new(0.0, 0.0), Point::new(2.0, 2.0))]);
        assert!(!layer.is_cached());

        layer.redraw(&mut backend);
        layer.set_background(Some(new_raster(16, 16)));
        assert!(!layer.is_cached());
    }

    #[test]
    fn test_cached_composite_only_draws_pending() {
        let mut layer = Layer::new(16, 16);
        let mut backend = Counting::default();
        for i in 0..5 {
            let p = Point::new(i as f64, i as f64);
            layer.add_node(rect_node(p, p + kurbo::Vec2::new(2.0, 2.0)));
        }
        let pending = rect_node(Point::new(8.0, 8.0), Point::new(12.0, 12.0));

        let full = layer.composite(&mut backend, Some(&pending), false);
        assert_eq!(backend.executed, 6);

        backend.executed = 0;
        let cached = layer.composite(&mut backend, Some(&pending), true);
        assert_eq!(backend.executed, 1);
        assert_eq!(full.as_raw(), cached.as_raw());
    }

    #[test]
    fn test_cache_miss_falls_back_to_full_redraw() {
        let mut layer = Layer::new(8, 8);
        let mut backend = Counting::default();
        layer.add_node(rect_node(Point::new(1.0, 1.0), Point::new(3.0, 3.0)));
        layer.composite(&mut backend, None, true);
        assert_eq!(backend.executed, 1);
        assert!(layer.is_cached());
    }

    #[test]
    fn test_hit_test_topmost_first() {
        let mut layer = Layer::new(100, 100);
        let bottom = rect_node(Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        let top = rect_node(Point::new(25.0, 25.0), Point::new(75.0, 75.0));
        let (bottom_id, top_id) = (bottom.id(), top.id());
        layer.add_node(bottom);
        layer.add_node(top);

        assert_eq!(layer.hit_test(Point::new(30.0, 30.0)).map(Node::id), Some(top_id));
        assert_eq!(layer.hit_test(Point::new(10.0, 10.0)).map(Node::id), Some(bottom_id));
        assert!(layer.hit_test(Point::new(90.0, 90.0)).is_none());
    }

    #[test]
    fn test_hit_test_skips_erasers() {
        let mut layer = Layer::new(100, 100);
        let rect = rect_node(Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        let rect_id = rect.id();
        layer.add_node(rect);
        layer.add_node(eraser_node(Point::new(10.0, 10.0), Point::new(40.0, 10.0)));
        assert_eq!(layer.hit_test(Point::new(20.0, 10.0)).map(Node::id), Some(rect_id));
    }

    #[test]
    fn test_insert_clamps_and_remove_reports_index() {
        let mut layer = Layer::new(10, 10);
        let a = rect_node(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = rect_node(Point::new(0.0, 0.0), Point::new(2.0, 2.0));
        let b_id = b.id();
        layer.add_node(a);
        layer.insert_node(99, b);
        assert_eq!(layer.index_of(b_id), Some(1));
        let (index, node) = layer.remove_node(b_id).unwrap();
        assert_eq!(index, 1);
        assert_eq!(node.id(), b_id);
        assert!(layer.remove_node(b_id).is_none());
    }

    #[test]
    fn test_opacity_clamped() {
        let mut layer = Layer::new(1, 1);
        layer.set_opacity(3.0);
        assert_eq!(layer.opacity(), 1.0);
        layer.set_opacity(-1.0);
        assert_eq!(layer.opacity(), 0.0);
    }
}
