use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: u32 = 20;

/// Reserved tile ids.
pub mod tile_id {
    /// No tile.
    pub const EMPTY: i32 = -1;
    pub const UNDEFINED: i32 = -2;
    pub const OCCUPIED: i32 = 1024;
}

/// How the ids of a layer are interpreted when drawing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerType {
    #[default]
    Normal,
    Autotiles,
    Collision,
    Zone,
}

/// Row-major grid of tile ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    width: usize,
    height: usize,
    kind: LayerType,
    tiles: Vec<i32>,
}

impl TileLayer {
    /// Creates a layer with every cell set to [`tile_id::EMPTY`].
    pub fn new(width: usize, height: usize, kind: LayerType) -> Self {
        Self {
            width,
            height,
            kind,
            tiles: vec![tile_id::EMPTY; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn kind(&self) -> LayerType {
        self.kind
    }

    #[inline]
    pub fn tiles(&self) -> &[i32] {
        &self.tiles
    }

    pub fn fill(&mut self, id: i32) {
        self.tiles.fill(id);
    }

    /// Writes one cell. Coordinates outside the grid are ignored.
    pub fn set_tile(&mut self, x: i32, y: i32, id: i32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.tiles[y as usize * self.width + x as usize] = id;
    }

    /// Writes one cell by flat index. Out-of-range indices are ignored.
    pub fn set_tile_index(&mut self, index: usize, id: i32) {
        if let Some(cell) = self.tiles.get_mut(index) {
            *cell = id;
        }
    }

    /// # Panics
    /// When `(x, y)` is outside the grid.
    pub fn tile_at(&self, x: usize, y: usize) -> i32 {
        assert!(
            x < self.width && y < self.height,
            "tile_at({x},{y}) is out of bounds for a {}x{} layer",
            self.width,
            self.height
        );
        self.tiles[y * self.width + x]
    }

    /// `tile_at` that tolerates any coordinate.
    pub fn get(&self, x: i32, y: i32) -> Option<i32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.tiles[y as usize * self.width + x as usize])
    }

    /// Decodes a run-length token stream into the layer, starting at cell 0.
    ///
    /// Tokens are separated by whitespace. A token is either a decimal id
    /// (one cell) or `x<N>` followed by the id to repeat `N` times. A run
    /// longer than the remaining grid is truncated and ends decoding; so does
    /// a bare id past the last cell. Malformed tokens end decoding with a
    /// warning. Cells that are not reached keep their previous value.
    ///
    /// Returns the number of cells written.
    pub fn decode_rle(&mut self, data: &str) -> usize {
        let len = self.tiles.len();
        let mut index: usize = 0;
        let mut tokens = data.split_whitespace();

        while let Some(token) = tokens.next() {
            if let Some(count) = token.strip_prefix('x') {
                let Ok(times) = count.parse::<usize>() else {
                    log::warn!("rle: bad run length {token:?} at cell {index}");
                    break;
                };
                let Some(value) = tokens.next() else {
                    log::warn!("rle: run {token:?} at cell {index} has no value");
                    break;
                };
                let Ok(value) = value.parse::<i32>() else {
                    log::warn!("rle: bad tile id {value:?} at cell {index}");
                    break;
                };

                let Some(end) = index.checked_add(times).filter(|&end| end <= len) else {
                    self.tiles[index..].fill(value);
                    log::debug!("rle: run of {times} at cell {index} truncated to {}", len - index);
                    index = len;
                    break;
                };
                self.tiles[index..end].fill(value);
                index = end;
            } else {
                let Ok(value) = token.parse::<i32>() else {
                    log::warn!("rle: bad tile id {token:?} at cell {index}");
                    break;
                };
                if index >= len {
                    log::debug!("rle: data continues past the last cell");
                    break;
                }
                self.tiles[index] = value;
                index += 1;
            }
        }
        index
    }

    /// Encodes the layer in the format read by [`decode_rle`](Self::decode_rle).
    ///
    /// Runs of three or more equal ids become `x<N> <id>`.
    pub fn encode_rle(&self) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < self.tiles.len() {
            let id = self.tiles[i];
            let run = self.tiles[i..].iter().take_while(|&&t| t == id).count();

            if !out.is_empty() {
                out.push(' ');
            }
            if run >= 3 {
                let _ = write!(out, "x{run} {id}");
                i += run;
            } else {
                let _ = write!(out, "{id}");
                i += 1;
            }
        }
        out
    }
}
