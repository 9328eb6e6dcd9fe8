//! Tile grids, autotiles and map loading.

mod autotile;
pub mod draw;
mod error;
mod layer;
pub mod map;
mod minitile;

pub use autotile::{create_autotiles, Autotile, AUTOTILE_BLOCK_TILES};
pub use error::TileError;
pub use layer::{tile_id, LayerType, TileLayer, TILE_SIZE};
pub use map::{Light, MapDesc, TileMap};
pub use minitile::{calc_minitiles, pack_minitile, unpack_minitile, unpack_minitiles, Minitile, Minitiles};
