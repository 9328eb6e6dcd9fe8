/// Letterboxed placement of the virtual screen inside a window surface.
///
/// The virtual screen keeps its aspect ratio and is centered; the rest of the
/// surface stays at the clear color.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Surface pixels per virtual pixel.
    pub scale: f32,
}

impl Viewport {
    /// Largest rect with the aspect ratio of `virtual_size` centered in `surface`.
    pub fn letterbox(virtual_size: (u32, u32), surface: (u32, u32)) -> Self {
        let (vw, vh) = (virtual_size.0.max(1) as f32, virtual_size.1.max(1) as f32);
        let (sw, sh) = (surface.0.max(1) as f32, surface.1.max(1) as f32);
        let scale = (sw / vw).min(sh / vh);
        let (width, height) = (vw * scale, vh * scale);
        Self {
            x: (sw - width) * 0.5,
            y: (sh - height) * 0.5,
            width,
            height,
            scale,
        }
    }

    /// Maps a surface position to virtual screen pixels.
    #[inline]
    pub fn to_virtual(&self, x: f32, y: f32) -> (f32, f32) {
        if self.scale <= 0.0 {
            return (x, y);
        }
        ((x - self.x) / self.scale, (y - self.y) / self.scale)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_fills_surface() {
        let v = Viewport::letterbox((340, 220), (680, 440));
        assert_eq!((v.x, v.y, v.width, v.height, v.scale), (0.0, 0.0, 680.0, 440.0, 2.0));
    }

    #[test]
    fn wide_surface_gets_side_bars() {
        let v = Viewport::letterbox((100, 100), (300, 200));
        assert_eq!((v.x, v.y, v.width, v.height), (50.0, 0.0, 200.0, 200.0));
        assert_eq!(v.to_virtual(150.0, 100.0), (50.0, 50.0));
        assert_eq!(v.to_virtual(50.0, 0.0), (0.0, 0.0));
    }
}
