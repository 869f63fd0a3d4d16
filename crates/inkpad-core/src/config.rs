//! Scene configuration.

use crate::brush::Brush;
use crate::history::DEFAULT_UNDO_DEPTH;
use crate::tools::ToolKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings a [`Scene`](crate::Scene) is created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Maximum number of undo entries kept.
    pub undo_depth: usize,
    /// Outset factor, in brush thicknesses, for freehand dirty rects.
    pub draw_distance: f64,
    /// Brush the scene starts with.
    pub brush: Brush,
    /// Tool the scene starts with.
    pub tool: ToolKind,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            undo_depth: DEFAULT_UNDO_DEPTH,
            draw_distance: 1.0,
            brush: Brush::default(),
            tool: ToolKind::default(),
        }
    }
}

impl SceneConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.undo_depth == 0 {
            return Err(ConfigError::Invalid("undo_depth must be at least 1".to_string()));
        }
        if !self.draw_distance.is_finite() || self.draw_distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "draw_distance must be a non-negative number, got {}",
                self.draw_distance
            )));
        }
        // Deserialized brushes skip the builder clamps.
        let brush = &self.brush;
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !brush.color().is_valid()
            || !brush.thickness().is_finite()
            || brush.thickness() < 0.0
            || !in_unit(brush.opacity())
            || !in_unit(brush.miter())
        {
            return Err(ConfigError::Invalid(format!("brush out of range: {:?}", brush)));
        }
        Ok(())
    }
}
