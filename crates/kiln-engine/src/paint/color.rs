use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Straight-alpha RGBA color.
///
/// Channels are nominally in `[0, 1]` but are never clamped: light colors and
/// additive tints may legitimately exceed 1.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Rejected hex color literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color {0:?}: expected 3 or 6 hex digits")]
    Length(String),
    #[error("invalid hex color {0:?}: not a hexadecimal number")]
    Digits(String),
}

impl Color {
    pub const WHITE: Color = rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = rgba(0.0, 0.0, 1.0, 1.0);
    /// `hex("0f0", 0.5)`.
    pub const SEMI_GREEN: Color = rgba(0.0, 1.0, 0.0, 0.5);
    pub const TRANSPARENT: Color = rgba(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the same color with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Multiplies rgb by alpha and returns an opaque color.
    ///
    /// Used for additive light contributions where alpha carries intensity.
    #[inline]
    pub fn intensity_scaled(self) -> Self {
        Self::new(self.r * self.a, self.g * self.a, self.b * self.a, 1.0)
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

/// Builds a color from normalized channels.
#[inline]
pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color::new(r, g, b, a)
}

/// Builds a color from 0–255 rgb channels. Alpha stays normalized.
#[inline]
pub fn rgba255(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color::new(r / 255.0, g / 255.0, b / 255.0, a)
}

/// Parses `"#ff0000"`, `"ff0000"`, `"#f00"` or `"f00"` plus a separate alpha.
///
/// Short form digits are expanded by ×17 (`f` → `ff`).
pub fn hex(s: &str, alpha: f32) -> Result<Color, ColorError> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 3 && digits.len() != 6 {
        return Err(ColorError::Length(s.to_string()));
    }
    let value = u32::from_str_radix(digits, 16).map_err(|_| ColorError::Digits(s.to_string()))?;

    let (r, g, b) = if digits.len() == 6 {
        ((value >> 16) & 0xFF, (value >> 8) & 0xFF, value & 0xFF)
    } else {
        (((value >> 8) & 0xF) * 17, ((value >> 4) & 0xF) * 17, (value & 0xF) * 17)
    };

    Ok(rgba255(r as f32, g as f32, b as f32, alpha))
}
