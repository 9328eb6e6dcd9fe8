use anyhow::{Context, Result};
use kiln_engine::input::Key;
use kiln_engine::paint::{rgba, Color};
use kiln_engine::render::{BlendMode, RenderTarget, Renderer, Shader, ShaderDesc, UniformValue};
use kiln_engine::scene::{InitCtx, Scene, UpdateCtx};
use kiln_engine::tiles::draw::{draw_autotiles, draw_layer};
use kiln_engine::tiles::{LayerType, Light, TileLayer, TileMap};

use crate::tileset::{self, Tileset};

const MAP: &str = include_str!("../../assets/maps/mines.json");
const LIGHT_SHADER: &str = include_str!("../shaders/light.wgsl");

const AMBIENT: f32 = 0.3;
/// Flat normal, cleared into the normal target before the layers are drawn.
const FLAT_NORMAL: Color = rgba(0.5, 0.5, 1.0, 1.0);

const LIGHT_SPEED: f32 = 100.0;
const RADIUS_SPEED: f32 = 40.0;

struct Pass {
    light: RenderTarget,
    normals: RenderTarget,
    shader: Shader,
}

/// Tile map lit by point lights over a normal map.
///
/// WASD moves the first light, Up/Down changes its radius.
#[derive(Default)]
pub struct TilemapScene {
    layers: Vec<(TileLayer, Tileset)>,
    lights: Vec<Light>,
    pass: Option<Pass>,
}

impl TilemapScene {
    fn draw_layers(&self, r: &mut Renderer, normals: bool) {
        for (layer, tileset) in &self.layers {
            let tex = if normals { tileset.normal } else { tileset.color };
            match (layer.kind(), &tileset.autotiles) {
                (LayerType::Autotiles, Some(autotiles)) => draw_autotiles(r, layer, autotiles, tex),
                _ => draw_layer(r, layer, tex),
            }
        }
    }

    fn draw_lights(&self, r: &mut Renderer, pass: &Pass) -> Result<()> {
        let (w, h) = r.resolution();

        r.set_render_target(Some(&pass.light));
        r.clear_render_target(Some(rgba(AMBIENT, AMBIENT, AMBIENT, 1.0)));
        r.set_blend_mode(BlendMode::Additive);
        r.set_shader(Some(&pass.shader));
        r.set_uniform(
            &pass.shader,
            "normal_texture",
            UniformValue::Texture { texture: pass.normals.texture(), unit: 1 },
        )?;

        for light in self.lights.iter().filter(|l| l.radius > 0.0) {
            r.set_uniform(&pass.shader, "light_pos", UniformValue::Vec2([light.x, light.y]))?;
            r.set_uniform(&pass.shader, "radius", UniformValue::Float(light.radius))?;

            let c = light.color.intensity_scaled();
            r.set_color(c.r, c.g, c.b, Some(1.0));
            r.draw_rect(0.0, 0.0, w as f32, h as f32);
            r.flush();
        }
        Ok(())
    }
}

impl Scene for TilemapScene {
    fn name(&self) -> &str {
        "tilemap"
    }

    fn init(&mut self, ctx: &mut InitCtx<'_>) -> Result<()> {
        log::info!("init tilemap");
        let r = &mut *ctx.renderer;

        let map = TileMap::from_json(MAP).context("failed to parse map")?;
        self.layers = map
            .layers
            .into_iter()
            .map(|layer| {
                let tileset = tileset::build(r, &layer.tileset)
                    .with_context(|| format!("layer tileset {:?}", layer.tileset))?;
                Ok::<_, anyhow::Error>((layer.tiles, tileset))
            })
            .collect::<Result<_>>()?;
        self.lights = map.lights;

        let (w, h) = r.resolution();
        let shader = r.create_shader(
            ShaderDesc::new("light", LIGHT_SHADER)
                .with_uniform("light_pos")
                .with_uniform("radius")
                .with_texture("normal_texture"),
        )?;
        self.pass = Some(Pass {
            light: r.create_render_target(w, h),
            normals: r.create_render_target(w, h),
            shader,
        });
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) {
        let dt = ctx.dt;
        let Some(light) = self.lights.first_mut() else { return };
        let input = ctx.input;

        if input.key_down(Key::W) {
            light.y -= LIGHT_SPEED * dt;
        } else if input.key_down(Key::S) {
            light.y += LIGHT_SPEED * dt;
        }
        if input.key_down(Key::A) {
            light.x -= LIGHT_SPEED * dt;
        } else if input.key_down(Key::D) {
            light.x += LIGHT_SPEED * dt;
        }

        if input.key_down(Key::Up) {
            light.radius += RADIUS_SPEED * dt;
        } else if input.key_down(Key::Down) {
            light.radius -= RADIUS_SPEED * dt;
        }
    }

    fn render(&mut self, r: &mut Renderer) {
        let Some(pass) = &self.pass else { return };

        // map
        r.set_render_target(None);
        r.set_blend_mode(BlendMode::Alpha);
        r.set_shader(None);
        r.set_color_value(Color::WHITE);
        self.draw_layers(r, false);

        // normal map
        r.set_render_target(Some(&pass.normals));
        r.clear_render_target(Some(FLAT_NORMAL));
        self.draw_layers(r, true);

        // light map
        if let Err(err) = self.draw_lights(r, pass) {
            log::warn!("light pass skipped: {err}");
        }

        r.set_render_target(None);
        r.set_blend_mode(BlendMode::Multiply);
        r.set_shader(None);
        r.set_color_value(Color::WHITE);
        r.draw_render_target(&pass.light, 0.0, 0.0);
    }

    fn clear_color(&self) -> Color {
        rgba(0.2, 0.2, 0.2, 1.0)
    }
}
