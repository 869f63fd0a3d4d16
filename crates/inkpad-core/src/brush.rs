//! Brush: the stroke style copied into every node at creation time.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// RGBA color with float components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Convert to 8-bit channels, clamping out-of-range components.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// Same color with alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Whether every component lies in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        Self::from_array(color.components)
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::new(color.to_array())
    }
}

/// Shape drawn at the open ends of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    Butt = 0,
    #[default]
    Round = 1,
    Square = 2,
}

impl LineCap {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(LineCap::Butt),
            1 => Some(LineCap::Round),
            2 => Some(LineCap::Square),
            _ => None,
        }
    }
}

/// Shape drawn where two stroke segments meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineJoin {
    Miter = 0,
    #[default]
    Round = 1,
    Bevel = 2,
}

impl LineJoin {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(LineJoin::Miter),
            1 => Some(LineJoin::Round),
            2 => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

/// Stroke style.
///
/// Fields are private so the value ranges hold: thickness is never
/// negative, opacity and miter are clamped into `[0, 1]`. Nodes store their
/// own copy, so changing the scene's current brush never touches shapes that
/// were already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    color: Rgba,
    thickness: f64,
    opacity: f32,
    miter: f32,
    cap: LineCap,
    join: LineJoin,
}

fn unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

impl Brush {
    /// Create a fully opaque brush with round caps and joins.
    pub fn new(color: Rgba, thickness: f64) -> Self {
        Self {
            color,
            thickness: 0.0,
            opacity: 1.0,
            miter: 1.0,
            cap: LineCap::default(),
            join: LineJoin::default(),
        }
        .with_thickness(thickness)
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Set the stroke thickness. Negative and NaN values become zero.
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = if thickness.is_nan() { 0.0 } else { thickness.max(0.0) };
        self
    }

    /// Set the opacity, clamped into `[0, 1]`.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = unit(opacity);
        self
    }

    /// Set the miter limit, clamped into `[0, 1]`.
    pub fn with_miter(mut self, miter: f32) -> Self {
        self.miter = unit(miter);
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn miter(&self) -> f32 {
        self.miter
    }

    pub fn cap(&self) -> LineCap {
        self.cap
    }

    pub fn join(&self) -> LineJoin {
        self.join
    }

    /// The color actually laid down: brush color with opacity applied.
    pub fn stroke_color(&self) -> Rgba {
        self.color.with_opacity(self.opacity)
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(Rgba::BLACK, 2.0)
    }
}
