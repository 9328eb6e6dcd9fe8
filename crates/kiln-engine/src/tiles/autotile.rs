use crate::coords::Rect;

use super::minitile::Minitiles;
use super::TileError;

/// Autotile block size in tiles.
pub const AUTOTILE_BLOCK_TILES: (u32, u32) = (2, 3);

// Half-tile frame indices (4 columns × 6 rows) per quadrant, by weight 0..=4.
const TL_FRAMES: [usize; 5] = [8, 10, 16, 2, 18];
const TR_FRAMES: [usize; 5] = [11, 19, 9, 3, 17];
const BL_FRAMES: [usize; 5] = [20, 12, 22, 6, 14];
const BR_FRAMES: [usize; 5] = [23, 21, 15, 7, 13];

/// Source rectangles of one autotile block.
///
/// A block is `2 × 3` tiles, cut into a `4 × 6` grid of half-tile frames.
/// Each quadrant list is indexed by that quadrant's minitile weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Autotile {
    pub tl: [Rect; 5],
    pub tr: [Rect; 5],
    pub bl: [Rect; 5],
    pub br: [Rect; 5],
    /// Whole tile with no neighbours.
    pub island: Rect,
    /// Whole tile surrounded on all sides.
    pub full: Rect,
}

impl Autotile {
    pub fn new(base_x: f32, base_y: f32, tile_size: f32) -> Self {
        let half = tile_size / 2.0;
        let frame = |i: usize| {
            let col = (i % 4) as f32;
            let row = (i / 4) as f32;
            Rect::new(base_x + col * half, base_y + row * half, half, half)
        };
        let pick = |table: [usize; 5]| table.map(frame);

        Self {
            tl: pick(TL_FRAMES),
            tr: pick(TR_FRAMES),
            bl: pick(BL_FRAMES),
            br: pick(BR_FRAMES),
            island: Rect::new(base_x, base_y, tile_size, tile_size),
            full: Rect::new(base_x + half, base_y + half * 3.0, tile_size, tile_size),
        }
    }

    /// Source rects `[tl, tr, bl, br]` for a set of quadrant weights.
    ///
    /// Weights above 4 are clamped.
    pub fn quadrants(&self, m: Minitiles) -> [Rect; 4] {
        let at = |list: &[Rect; 5], w: u8| list[(w as usize).min(4)];
        [at(&self.tl, m.tl), at(&self.tr, m.tr), at(&self.bl, m.bl), at(&self.br, m.br)]
    }
}

/// Cuts an autotile texture into blocks, row-major.
///
/// Fails when the texture is not an exact multiple of the block size.
pub fn create_autotiles(tex_width: u32, tex_height: u32, tile_size: u32) -> Result<Vec<Autotile>, TileError> {
    let block_w = tile_size * AUTOTILE_BLOCK_TILES.0;
    let block_h = tile_size * AUTOTILE_BLOCK_TILES.1;

    if block_w == 0 || tex_width % block_w != 0 || tex_height % block_h != 0 {
        return Err(TileError::AutotileSize {
            width: tex_width,
            height: tex_height,
            block_w,
            block_h,
        });
    }

    let (cols, rows) = (tex_width / block_w, tex_height / block_h);
    let mut out = Vec::with_capacity((cols * rows) as usize);
    for y in 0..rows {
        for x in 0..cols {
            out.push(Autotile::new((x * block_w) as f32, (y * block_h) as f32, tile_size as f32));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_follow_the_half_tile_grid() {
        let a = Autotile::new(0.0, 0.0, 20.0);
        // frame 8 = col 0, row 2
        assert_eq!(a.tl[0], Rect::new(0.0, 20.0, 10.0, 10.0));
        // frame 17 = col 1, row 4
        assert_eq!(a.tr[4], Rect::new(10.0, 40.0, 10.0, 10.0));
        // frame 23 = col 3, row 5
        assert_eq!(a.br[0], Rect::new(30.0, 50.0, 10.0, 10.0));
        assert_eq!(a.island, Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(a.full, Rect::new(10.0, 30.0, 20.0, 20.0));
    }

    #[test]
    fn blocks_are_row_major() {
        let tiles = create_autotiles(80, 120, 20).unwrap();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[1].island.x, 40.0);
        assert_eq!(tiles[1].island.y, 0.0);
        assert_eq!(tiles[2].island.x, 0.0);
        assert_eq!(tiles[2].island.y, 60.0);
    }

    #[test]
    fn non_multiple_texture_is_rejected() {
        assert!(matches!(
            create_autotiles(50, 60, 20),
            Err(TileError::AutotileSize { block_w: 40, block_h: 60, .. })
        ));
        assert!(create_autotiles(40, 61, 20).is_err());
        assert!(create_autotiles(40, 60, 0).is_err());
    }

    #[test]
    fn quadrants_pick_by_weight() {
        let a = Autotile::new(0.0, 0.0, 20.0);
        let m = Minitiles { tl: 4, tr: 0, bl: 2, br: 9 };
        assert_eq!(a.quadrants(m), [a.tl[4], a.tr[0], a.bl[2], a.br[4]]);
    }
}
