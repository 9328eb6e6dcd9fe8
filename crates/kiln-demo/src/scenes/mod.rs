mod shapes;
mod tilemap;

pub use shapes::ShapesScene;
pub use tilemap::TilemapScene;
