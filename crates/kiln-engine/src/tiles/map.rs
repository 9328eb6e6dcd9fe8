//! JSON map description and its decoded form.

use serde::{Deserialize, Serialize};

use crate::paint::Color;

use super::{LayerType, TileError, TileLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDesc {
    #[serde(rename = "type", default)]
    pub kind: LayerType,
    /// Tileset name, resolved by the caller (e.g. `tilesets/<name>.png`).
    pub tileset: String,
    /// RLE-encoded ids.
    #[serde(default)]
    pub data: String,
}

/// Point light. `color.a` is the intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
}

/// Map file as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDesc {
    pub info: MapInfo,
    pub layers: Vec<LayerDesc>,
    #[serde(default)]
    pub lights: Vec<Light>,
}

#[derive(Debug, Clone)]
pub struct MapLayer {
    pub tiles: TileLayer,
    pub tileset: String,
}

/// Map with every layer decoded.
#[derive(Debug, Clone)]
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    pub layers: Vec<MapLayer>,
    pub lights: Vec<Light>,
}

impl TileMap {
    pub fn from_json(json: &str) -> Result<Self, TileError> {
        let desc: MapDesc = serde_json::from_str(json)?;
        Ok(Self::from_desc(&desc))
    }

    pub fn from_desc(desc: &MapDesc) -> Self {
        let MapInfo { width, height } = desc.info;
        let layers = desc
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let mut tiles = TileLayer::new(width, height, l.kind);
                let written = tiles.decode_rle(&l.data);
                log::debug!(
                    "map layer {i} ({:?}, tileset {:?}): {written}/{} cells",
                    l.kind,
                    l.tileset,
                    width * height
                );
                MapLayer {
                    tiles,
                    tileset: l.tileset.clone(),
                }
            })
            .collect();

        Self {
            width,
            height,
            layers,
            lights: desc.lights.clone(),
        }
    }

    /// Inverse of [`from_desc`](Self::from_desc).
    pub fn to_desc(&self) -> MapDesc {
        MapDesc {
            info: MapInfo {
                width: self.width,
                height: self.height,
            },
            layers: self
                .layers
                .iter()
                .map(|l| LayerDesc {
                    kind: l.tiles.kind(),
                    tileset: l.tileset.clone(),
                    data: l.tiles.encode_rle(),
                })
                .collect(),
            lights: self.lights.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "info": { "width": 3, "height": 2 },
        "layers": [
            { "type": "Autotiles", "tileset": "mines_auto", "data": "x3 0 -1 1 -1" },
            { "type": "Normal", "tileset": "mines", "data": "x6 -1" }
        ],
        "lights": [
            { "x": 10, "y": 20, "radius": 64, "color": [1.0, 0.5, 0.25, 0.8] }
        ]
    }"#;

    #[test]
    fn parses_layers_and_lights() {
        let map = TileMap::from_json(MAP).unwrap();
        assert_eq!((map.width, map.height), (3, 2));
        assert_eq!(map.layers.len(), 2);

        let auto = &map.layers[0];
        assert_eq!(auto.tiles.kind(), LayerType::Autotiles);
        assert_eq!(auto.tileset, "mines_auto");
        assert_eq!(auto.tiles.tiles(), &[0, 0, 0, -1, 1, -1]);

        assert_eq!(map.lights[0].radius, 64.0);
        assert_eq!(map.lights[0].color, Color::new(1.0, 0.5, 0.25, 0.8));
    }

    #[test]
    fn lights_are_optional() {
        let json = r#"{ "info": { "width": 1, "height": 1 }, "layers": [] }"#;
        assert!(TileMap::from_json(json).unwrap().lights.is_empty());
    }

    #[test]
    fn unknown_layer_type_is_an_error() {
        let json = r#"{ "info": { "width": 1, "height": 1 },
                        "layers": [{ "type": "Lava", "tileset": "x", "data": "0" }] }"#;
        assert!(matches!(TileMap::from_json(json), Err(TileError::MapJson(_))));
    }

    #[test]
    fn desc_survives_decode_and_encode() {
        let map = TileMap::from_json(MAP).unwrap();
        let again = TileMap::from_desc(&map.to_desc());
        assert_eq!(again.layers[0].tiles, map.layers[0].tiles);
        assert_eq!(again.layers[1].tiles, map.layers[1].tiles);
    }
}
