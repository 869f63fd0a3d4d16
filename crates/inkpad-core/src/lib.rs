//! inkpad core library
//!
//! Scene model for a freehand and shape drawing surface: brushes, path
//! building from pointer samples, per-kind hit testing, layered
//! compositing with a raster cache, undo/redo, and persistence.
//!
//! Pixels are produced by a [`RenderBackend`] supplied by the host.

pub mod brush;
pub mod config;
pub mod document;
pub mod geometry;
pub mod history;
pub mod input;
pub mod layer;
pub mod node;
pub mod path;
pub mod render;
pub mod scene;
pub mod serialize;
pub mod storage;
pub mod tools;

pub use brush::{Brush, LineCap, LineJoin, Rgba};
pub use config::{ConfigError, SceneConfig};
pub use document::{LayerRecord, SceneDocument};
pub use history::{History, Reversible};
pub use input::{PointerEvent, PointerId};
pub use layer::Layer;
pub use node::{Node, NodeId, NodeKind};
pub use path::{GestureState, PathInstruction};
pub use render::{BlendMode, DrawCommand, RenderBackend, StrokePattern};
pub use scene::{LayerStack, Position, Scene, SceneAction};
pub use serialize::{DecodeError, DecodeResult, NodeRecord};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult};
pub use tools::ToolKind;

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
