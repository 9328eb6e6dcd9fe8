//! Quadrant ("minitile") weights of autotiled cells.

use super::TileLayer;

/// Bit offset of each quadrant in a packed minitile word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum Minitile {
    BottomRight = 0,
    BottomLeft = 8,
    TopRight = 16,
    TopLeft = 24,
}

/// Unpacked quadrant weights, each 0..=4.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Minitiles {
    pub tl: u8,
    pub tr: u8,
    pub bl: u8,
    pub br: u8,
}

#[inline]
pub fn pack_minitile(tl: u8, tr: u8, bl: u8, br: u8) -> u32 {
    ((tl as u32) << Minitile::TopLeft as u32)
        | ((tr as u32) << Minitile::TopRight as u32)
        | ((bl as u32) << Minitile::BottomLeft as u32)
        | br as u32
}

#[inline]
pub fn unpack_minitile(packed: u32, which: Minitile) -> u8 {
    ((packed >> which as u32) & 0xFF) as u8
}

pub fn unpack_minitiles(packed: u32) -> Minitiles {
    Minitiles {
        tl: unpack_minitile(packed, Minitile::TopLeft),
        tr: unpack_minitile(packed, Minitile::TopRight),
        bl: unpack_minitile(packed, Minitile::BottomLeft),
        br: unpack_minitile(packed, Minitile::BottomRight),
    }
}

/// Computes the packed quadrant weights of the cell `(x, y)` holding `id`.
///
/// Each matching orthogonal neighbour adds to the two quadrants it touches.
/// A quadrant at 3 becomes 4 when its diagonal neighbour also matches.
/// Cells on the map border are forced closed along that border.
///
/// | neighbour | tl | tr | bl | br |
/// |-----------|----|----|----|----|
/// | up        | +2 | +1 |    |    |
/// | down      |    |    | +1 | +2 |
/// | left      | +1 |    | +2 |    |
/// | right     |    | +2 |    | +1 |
///
/// Top/bottom border overrides are applied before left/right ones, so
/// corner cells end up with the left/right result for the shared quadrant.
///
/// # Panics
/// When `(x, y)` is outside the layer.
pub fn calc_minitiles(layer: &TileLayer, x: usize, y: usize, id: i32) -> u32 {
    let (w, h) = (layer.width(), layer.height());
    let at = |x: usize, y: usize| layer.tile_at(x, y) == id;

    let has_up = y > 0;
    let has_down = y + 1 < h;
    let has_left = x > 0;
    let has_right = x + 1 < w;

    let (mut tl, mut tr, mut bl, mut br) = (0u8, 0u8, 0u8, 0u8);

    if has_up && at(x, y - 1) {
        tl += 2;
        tr += 1;
    }
    if has_down && at(x, y + 1) {
        bl += 1;
        br += 2;
    }
    if has_left && at(x - 1, y) {
        tl += 1;
        bl += 2;
    }
    if has_right && at(x + 1, y) {
        tr += 2;
        br += 1;
    }

    // Diagonals.
    if has_up && has_left && at(x - 1, y) && at(x - 1, y - 1) && tl == 3 {
        tl = 4;
    }
    if has_up && has_right && at(x + 1, y) && at(x + 1, y - 1) && tr == 3 {
        tr = 4;
    }
    if has_down && has_left && at(x - 1, y) && at(x - 1, y + 1) && bl == 3 {
        bl = 4;
    }
    if has_down && has_right && at(x + 1, y) && at(x + 1, y + 1) && br == 3 {
        br = 4;
    }

    // Map border.
    let right = (x + 1).min(w - 1);
    let left = x.saturating_sub(1);
    let down = (y + 1).min(h - 1);
    let up = y.saturating_sub(1);

    if y == 0 {
        tl = 4;
        tr = 4;
        if !at(right, y) {
            tr = 1;
        } else if !at(left, y) {
            tl = 2;
        }
    } else if y + 1 >= h {
        bl = 4;
        br = 4;
        if !at(right, y) {
            br = 2;
        } else if !at(left, y) {
            bl = 1;
        }
    }

    if x == 0 {
        tl = 4;
        bl = 4;
        if !at(x, up) {
            tl = 1;
        } else if !at(x, down) {
            bl = 2;
        }
    } else if x + 1 >= w {
        tr = 4;
        br = 4;
        if !at(x, up) {
            tr = 2;
        } else if !at(x, down) {
            br = 1;
        }
    }

    pack_minitile(tl, tr, bl, br)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::LayerType;

    const ID: i32 = 3;

    /// Builds a layer from rows of `#` (= `ID`) and `.` (empty).
    fn layer(rows: &[&str]) -> TileLayer {
        let mut l = TileLayer::new(rows[0].len(), rows.len(), LayerType::Autotiles);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    l.set_tile(x as i32, y as i32, ID);
                }
            }
        }
        l
    }

    fn weights(l: &TileLayer, x: usize, y: usize) -> (u8, u8, u8, u8) {
        let m = unpack_minitiles(calc_minitiles(l, x, y, ID));
        (m.tl, m.tr, m.bl, m.br)
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn pack_layout() {
        assert_eq!(pack_minitile(1, 2, 3, 4), 0x0102_0304);
        assert_eq!(unpack_minitile(0x0102_0304, Minitile::TopRight), 2);
    }

    #[test]
    fn pack_unpack_round_trip() {
        for tl in 0..=4 {
            for tr in 0..=4 {
                for bl in 0..=4 {
                    for br in 0..=4 {
                        let m = unpack_minitiles(pack_minitile(tl, tr, bl, br));
                        assert_eq!(m, Minitiles { tl, tr, bl, br });
                    }
                }
            }
        }
    }

    // ── interior ──────────────────────────────────────────────────────────

    #[test]
    fn isolated_interior_tile_has_zero_weights() {
        let l = layer(&[".....", ".....", "..#..", ".....", "....."]);
        assert_eq!(weights(&l, 2, 2), (0, 0, 0, 0));
    }

    #[test]
    fn surrounded_interior_tile_is_all_fours() {
        let l = layer(&["#####", "#####", "#####", "#####", "#####"]);
        assert_eq!(weights(&l, 2, 2), (4, 4, 4, 4));
    }

    #[test]
    fn single_neighbours_add_their_weights() {
        let up = layer(&[".....", "..#..", "..#..", ".....", "....."]);
        assert_eq!(weights(&up, 2, 2), (2, 1, 0, 0));

        let down = layer(&[".....", ".....", "..#..", "..#..", "....."]);
        assert_eq!(weights(&down, 2, 2), (0, 0, 1, 2));

        let left = layer(&[".....", ".....", ".##..", ".....", "....."]);
        assert_eq!(weights(&left, 2, 2), (1, 0, 2, 0));

        let right = layer(&[".....", ".....", "..##.", ".....", "....."]);
        assert_eq!(weights(&right, 2, 2), (0, 2, 0, 1));
    }

    #[test]
    fn corner_without_diagonal_stays_at_three() {
        let l = layer(&[".....", "..#..", ".##..", ".....", "....."]);
        assert_eq!(weights(&l, 2, 2), (3, 1, 2, 0));

        let with_diag = layer(&[".....", ".##..", ".##..", ".....", "....."]);
        assert_eq!(weights(&with_diag, 2, 2), (4, 1, 2, 0));
    }

    #[test]
    fn other_ids_do_not_count() {
        let mut l = layer(&["#####", "#####", "#####", "#####", "#####"]);
        l.set_tile(2, 1, ID + 1);
        assert_eq!(weights(&l, 2, 2), (1, 2, 4, 4));
    }

    // ── border ────────────────────────────────────────────────────────────

    #[test]
    fn top_edge_open_to_the_right() {
        let l = layer(&["##.", "...", "..."]);
        assert_eq!(weights(&l, 1, 0), (4, 1, 2, 0));
    }

    #[test]
    fn top_edge_open_to_the_left() {
        let l = layer(&[".##", "...", "..."]);
        assert_eq!(weights(&l, 1, 0), (2, 4, 0, 1));
    }

    #[test]
    fn bottom_edge_open_to_the_right() {
        let l = layer(&["...", "...", "##."]);
        assert_eq!(weights(&l, 1, 2), (1, 0, 4, 2));
    }

    #[test]
    fn right_edge_open_upwards() {
        let l = layer(&["...", "..#", "..#"]);
        assert_eq!(weights(&l, 2, 1), (0, 2, 1, 4));
    }

    #[test]
    fn left_edge_open_downwards() {
        let l = layer(&["#..", "#..", "..."]);
        assert_eq!(weights(&l, 0, 1), (4, 1, 2, 0));
    }

    #[test]
    fn isolated_top_left_corner() {
        let l = layer(&["#..", "...", "..."]);
        // top rule: tl=tr=4, right differs -> tr=1
        // left rule: tl=bl=4, up is the cell itself, down differs -> bl=2
        assert_eq!(weights(&l, 0, 0), (4, 1, 2, 0));
    }

    #[test]
    fn filled_corners_are_closed() {
        let l = layer(&["###", "###", "###"]);
        assert_eq!(weights(&l, 0, 0), (4, 4, 4, 4));
        assert_eq!(weights(&l, 2, 0), (4, 4, 4, 4));
        assert_eq!(weights(&l, 0, 2), (4, 4, 4, 4));
        assert_eq!(weights(&l, 2, 2), (4, 4, 4, 4));
    }

    #[test]
    fn bottom_right_corner_horizontal_rule_wins() {
        // bottom rule: left differs -> bl=1
        // right rule: br back to 4, up differs -> tr=2
        let l = layer(&["...", "...", "..#"]);
        assert_eq!(weights(&l, 2, 2), (0, 2, 1, 4));
    }
}
