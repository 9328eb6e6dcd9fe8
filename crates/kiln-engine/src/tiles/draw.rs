//! Drawing tile layers through the batch renderer.

use crate::render::{Renderer, TextureHandle};

use super::{calc_minitiles, tile_id, unpack_minitiles, Autotile, TileLayer, TILE_SIZE};

/// Draws every non-empty cell of `layer`, picking the source tile from
/// `tileset` by id (row-major, `tileset_width / TILE_SIZE` columns).
pub fn draw_layer(r: &mut Renderer, layer: &TileLayer, tileset: TextureHandle) {
    let ts = TILE_SIZE as f32;
    let columns = (r.texture_size(tileset).0 / TILE_SIZE) as i32;
    if columns == 0 {
        // not loaded yet
        return;
    }

    for y in 0..layer.height() {
        for x in 0..layer.width() {
            let id = layer.tile_at(x, y);
            if id < 0 {
                continue;
            }
            let sx = (id % columns) as f32 * ts;
            let sy = (id / columns) as f32 * ts;
            r.draw_tex_rect(tileset, x as f32 * ts, y as f32 * ts, sx, sy, ts, ts);
        }
    }
}

/// Draws an autotile layer. Ids without a matching entry in `autotiles` are
/// skipped.
pub fn draw_autotiles(r: &mut Renderer, layer: &TileLayer, autotiles: &[Autotile], tileset: TextureHandle) {
    for y in 0..layer.height() {
        for x in 0..layer.width() {
            let id = layer.tile_at(x, y);
            if id == tile_id::EMPTY {
                continue;
            }
            let Some(autotile) = usize::try_from(id).ok().and_then(|i| autotiles.get(i)) else {
                continue;
            };
            let packed = calc_minitiles(layer, x, y, id);
            draw_autotile(r, x, y, autotile, packed, tileset);
        }
    }
}

/// Draws one cell as four half-tile quads.
pub fn draw_autotile(r: &mut Renderer, x: usize, y: usize, autotile: &Autotile, packed: u32, tileset: TextureHandle) {
    let ts = TILE_SIZE as f32;
    let half = ts / 2.0;
    let (px, py) = (x as f32 * ts, y as f32 * ts);

    let [tl, tr, bl, br] = autotile.quadrants(unpack_minitiles(packed));
    r.draw_tex_region(tileset, px, py, tl);
    r.draw_tex_region(tileset, px + half, py, tr);
    r.draw_tex_region(tileset, px, py + half, bl);
    r.draw_tex_region(tileset, px + half, py + half, br);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{CallLog, HeadlessBackend};
    use crate::render::RendererConfig;
    use crate::tiles::{create_autotiles, LayerType};
    use crate::paint::Color;

    fn renderer() -> (Renderer, CallLog) {
        let (backend, log) = HeadlessBackend::with_log();
        (Renderer::new(Box::new(backend), RendererConfig::default()), log)
    }

    fn tileset(r: &mut Renderer, w: u32, h: u32) -> TextureHandle {
        r.create_texture(w, h, &vec![255; (w * h * 4) as usize])
    }

    #[test]
    fn layer_draws_one_quad_per_tile() {
        let (mut r, log) = renderer();
        let tex = tileset(&mut r, 60, 40);
        let mut layer = TileLayer::new(4, 3, LayerType::Normal);
        layer.set_tile(0, 0, 0);
        layer.set_tile(3, 2, 4);

        r.begin_frame(Color::BLACK);
        draw_layer(&mut r, &layer, tex);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices.len(), 12);

        // id 4 with 3 columns -> source (20, 20), drawn at (60, 40)
        let v = &draws[0].vertices[6];
        assert_eq!(v.pos, [60.0, 40.0]);
        assert_eq!(v.uv, [20.0 / 60.0, 20.0 / 40.0]);
    }

    #[test]
    fn tileset_narrower_than_a_tile_draws_nothing() {
        let (mut r, log) = renderer();
        let tex = tileset(&mut r, 10, 10);
        let mut layer = TileLayer::new(2, 2, LayerType::Normal);
        layer.fill(0);

        r.begin_frame(Color::BLACK);
        draw_layer(&mut r, &layer, tex);
        r.end_frame();
        assert!(log.draws().is_empty());
    }

    #[test]
    fn autotile_cell_is_four_quads() {
        let (mut r, log) = renderer();
        let tex = tileset(&mut r, 40, 60);
        let autotiles = create_autotiles(40, 60, TILE_SIZE).unwrap();
        let mut layer = TileLayer::new(3, 3, LayerType::Autotiles);
        layer.set_tile(1, 1, 0);
        // no autotile for this id
        layer.set_tile(0, 0, 7);

        r.begin_frame(Color::BLACK);
        draw_autotiles(&mut r, &layer, &autotiles, tex);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices.len(), 4 * 6);
        assert_eq!(draws[0].vertices[0].pos, [20.0, 20.0]);
        assert_eq!(draws[0].vertices[6].pos, [30.0, 20.0]);
    }
}
