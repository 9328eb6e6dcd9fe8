/// Axis-aligned rectangle in pixels (top-left origin).
///
/// Used for texture source regions (autotile frames, tileset cells) and
/// screen-space destinations.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    #[inline]
    pub fn right(self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(self) -> f32 {
        self.y + self.h
    }

    /// Clamps the rect into `[0, width] × [0, height]`.
    ///
    /// Origin is clamped first, then the extent is clamped to what remains,
    /// so a rect hanging over an edge is cut rather than moved.
    pub fn clamped_to(self, width: f32, height: f32) -> Rect {
        let x = self.x.clamp(0.0, width.max(0.0));
        let y = self.y.clamp(0.0, height.max(0.0));
        let w = self.w.clamp(0.0, width - x);
        let h = self.h.clamp(0.0, height - y);
        Rect::new(x, y, w, h)
    }

    /// Normalized texture coordinates `(u0, v0, u1, v1)` of this rect inside a
    /// `width × height` texture.
    ///
    /// Returns `None` for zero-sized textures (not yet loaded).
    pub fn uv_in(self, width: f32, height: f32) -> Option<(f32, f32, f32, f32)> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some((self.x / width, self.y / height, self.right() / width, self.bottom() / height))
    }
}
