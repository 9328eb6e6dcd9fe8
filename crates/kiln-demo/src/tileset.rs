//! Procedural tilesets.
//!
//! Every tileset comes as a color image plus a matching normal map with the
//! same layout. Normals are stored as `rgb = n * 0.5 + 0.5` with +Y up.

use anyhow::{bail, Result};
use kiln_engine::render::{Renderer, TextureHandle};
use kiln_engine::tiles::{create_autotiles, Autotile, AUTOTILE_BLOCK_TILES, TILE_SIZE};

/// Normal pointing straight out of the screen.
const FLAT: [u8; 4] = [128, 128, 255, 255];

const BORDER: u32 = 2;

/// Fill and border colors.
type Palette = ([u8; 3], [u8; 3]);

pub struct Tileset {
    pub color: TextureHandle,
    pub normal: TextureHandle,
    /// Present for autotile sheets; indexed by tile id.
    pub autotiles: Option<Vec<Autotile>>,
}

/// Builds the tileset called `name` as referenced by map layers.
pub fn build(r: &mut Renderer, name: &str) -> Result<Tileset> {
    match name {
        "floor" => {
            let (w, h, color, normal) = floor_sheet();
            Ok(Tileset {
                color: r.create_texture(w, h, &color),
                normal: r.create_texture(w, h, &normal),
                autotiles: None,
            })
        }
        "rock" => {
            let palettes = [([96, 84, 72], [52, 44, 38]), ([40, 90, 150], [20, 50, 96])];
            let (w, h, color, normal) = autotile_sheet(&palettes);
            let autotiles = create_autotiles(w, h, TILE_SIZE)?;
            Ok(Tileset {
                color: r.create_texture(w, h, &color),
                normal: r.create_texture(w, h, &normal),
                autotiles: Some(autotiles),
            })
        }
        other => bail!("unknown tileset {other:?}"),
    }
}

/// Small deterministic hash used for texture noise.
fn noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed.wrapping_mul(2_246_822_519);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h >> 24) as u8
}

struct Sheet {
    width: u32,
    color: Vec<u8>,
    normal: Vec<u8>,
}

impl Sheet {
    fn new(width: u32, height: u32) -> Self {
        let len = (width * height * 4) as usize;
        Self {
            width,
            color: vec![0; len],
            normal: FLAT.repeat(len / 4),
        }
    }

    fn put(&mut self, x: u32, y: u32, color: [u8; 4], normal: [u8; 4]) {
        let i = ((y * self.width + x) * 4) as usize;
        self.color[i..i + 4].copy_from_slice(&color);
        self.normal[i..i + 4].copy_from_slice(&normal);
    }

    /// Fills a `w×h` box with `base` and a beveled `edge` border. The bevel
    /// normals lean away from the box centre.
    fn bevel_box(&mut self, x0: u32, y0: u32, w: u32, h: u32, (base, edge): Palette, seed: u32) {
        for y in 0..h {
            for x in 0..w {
                let left = x < BORDER;
                let right = x + BORDER >= w;
                let top = y < BORDER;
                let bottom = y + BORDER >= h;

                let n = noise(x0 + x, y0 + y, seed) / 16;
                let [r, g, b] = if left || right || top || bottom { edge } else { base };
                let color = [r.saturating_add(n), g.saturating_add(n), b.saturating_add(n), 255];

                let nx: u8 = if left { 40 } else if right { 216 } else { 128 };
                let ny: u8 = if top { 216 } else if bottom { 40 } else { 128 };
                let nz = if nx != 128 || ny != 128 { 200 } else { 255 };
                self.put(x0 + x, y0 + y, color, [nx, ny, nz, 255]);
            }
        }
    }
}

/// One row of plain tiles: floor, cracked floor, crate.
fn floor_sheet() -> (u32, u32, Vec<u8>, Vec<u8>) {
    const TILES: u32 = 3;
    let t = TILE_SIZE;
    let mut sheet = Sheet::new(t * TILES, t);

    for tile in 0..2 {
        for y in 0..t {
            for x in 0..t {
                let px = tile * t + x;
                let n = noise(px, y, 7) / 12;
                let grout = x == 0 || y == 0;
                let crack = tile == 1 && x == y && x > 3 && x < t - 3;

                let v = if grout || crack { 34 } else { 70 + n };
                let normal = if grout || crack {
                    [150, 106, 230, 255]
                } else {
                    [120 + n / 2, 120 + n / 2, 255, 255]
                };
                sheet.put(px, y, [v, v, v + 6, 255], normal);
            }
        }
    }

    sheet.bevel_box(2 * t + 1, 1, t - 2, t - 2, ([128, 92, 52], [84, 58, 30]), 11);

    (sheet.width, t, sheet.color, sheet.normal)
}

/// Autotile blocks side by side, one per palette.
///
/// Each block is 2×3 tiles: the island tile on top (left column), the
/// 2×2 tile frame below it.
fn autotile_sheet(palettes: &[Palette]) -> (u32, u32, Vec<u8>, Vec<u8>) {
    let (cols, rows) = AUTOTILE_BLOCK_TILES;
    let t = TILE_SIZE;
    let (block_w, block_h) = (cols * t, rows * t);
    let mut sheet = Sheet::new(block_w * palettes.len() as u32, block_h);

    for (i, &palette) in palettes.iter().enumerate() {
        let x0 = i as u32 * block_w;
        sheet.bevel_box(x0, 0, t, t, palette, i as u32);
        sheet.bevel_box(x0, t, block_w, block_h - t, palette, i as u32);
    }

    (sheet.width, block_h, sheet.color, sheet.normal)
}
