use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("autotile texture {width}x{height} is not a multiple of the {block_w}x{block_h} block size")]
    AutotileSize {
        width: u32,
        height: u32,
        block_w: u32,
        block_h: u32,
    },

    #[error("invalid map description")]
    MapJson(#[from] serde_json::Error),
}
