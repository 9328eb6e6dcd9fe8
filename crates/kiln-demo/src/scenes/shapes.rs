use std::f32::consts::FRAC_PI_2;

use anyhow::Result;
use kiln_engine::audio::{FadeCurve, Sound, SoundOptions};
use kiln_engine::input::{Key, MouseButton};
use kiln_engine::paint::{rgba, Color};
use kiln_engine::render::{
    BlendMode, RenderTarget, Renderer, Shader, ShaderDesc, TextureHandle, UniformValue, Vertex,
};
use kiln_engine::scene::{InitCtx, Scene, UpdateCtx};

const GRAYSCALE_SHADER: &str = include_str!("../shaders/grayscale.wgsl");

const SFX_CHANNEL: usize = 1;
const FADE_SECONDS: f32 = 2.0;

struct Assets {
    checker: TextureHandle,
    grayscale: Shader,
    target: RenderTarget,
    sound: Sound,
}

/// Renderer showcase: raw triangles and quads, shape helpers, the transform
/// stack and render-to-texture.
///
/// Space starts a looping sound on channel 1; left/right click fades it out
/// and back in.
#[derive(Default)]
pub struct ShapesScene {
    assets: Option<Assets>,
    time: f32,
}

fn checker(size: u32, cell: u32) -> Vec<u8> {
    let mut px = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let on = (x / cell + y / cell) % 2 == 0;
            let color: [u8; 4] = if on { [230, 200, 60, 255] } else { [60, 40, 120, 255] };
            px.extend_from_slice(&color);
        }
    }
    px
}

impl ShapesScene {
    fn draw_basic(&self, r: &mut Renderer, checker: TextureHandle) {
        // 10 columns of triangles, +Y is down
        for i in 0..20 {
            let x = (i % 10) as f32 * 17.0;
            let y = 150.0 + (i / 10) as f32 * 11.0;
            let c = rgba(0.1 + 0.8 * i as f32 / 20.0, 0.0, 0.2, 1.0);
            r.draw_triangle(
                Vertex::colored(x, y + 11.0, c),
                Vertex::colored(x + 17.0, y + 11.0, c),
                Vertex::colored(x + 8.5, y, c),
            );
        }

        let w = Color::WHITE;
        r.draw_quad(
            Vertex::colored(180.0, 150.0, w),
            Vertex::colored(220.0, 150.0, w),
            Vertex::colored(220.0, 190.0, w),
            Vertex::colored(180.0, 190.0, Color::RED),
        );
        r.draw_quad_textured(
            checker,
            Vertex::textured(230.0, 150.0, w, 0.0, 0.0),
            Vertex::textured(270.0, 150.0, w, 1.0, 0.0),
            Vertex::textured(270.0, 190.0, w, 1.0, 1.0),
            Vertex::textured(230.0, 190.0, w, 0.0, 1.0),
        );
    }

    fn draw_shapes(&self, r: &mut Renderer) {
        r.set_blend_mode(BlendMode::Alpha);
        r.set_color(1.0, 1.0, 1.0, None);
        r.set_alpha(0.6);
        r.draw_point(10.0, 30.0);
        r.draw_tri(20.0, 10.0, 30.0, 30.0, 40.0, 10.0);

        r.set_color(0.3, 0.3, 0.3, Some(0.5));
        r.draw_rect(10.0, 20.0, 100.0, 30.0);

        r.set_color(1.0, 0.0, 0.0, Some(0.5));
        r.draw_circle(50.0, 90.0, 25.0);
    }

    fn draw_translated(&self, r: &mut Renderer) {
        r.set_color_value(Color::SEMI_GREEN);
        r.push();
        r.translate(120.0, 20.0);
        r.scale(0.75, 0.75);
        r.translate(50.0, 25.0);
        r.rotate(FRAC_PI_2 + self.time);
        r.translate(-50.0, -25.0);
        r.draw_rect(0.0, 0.0, 100.0, 50.0);
        r.pop();

        r.push();
        r.set_color_value(Color::WHITE);
        r.translate(10.0, 10.0);
        r.draw_rect(0.0, 0.0, 10.0, 10.0);
        r.pop();
    }

    fn draw_to_texture(&self, r: &mut Renderer, assets: &Assets) {
        r.set_render_target(Some(&assets.target));
        r.clear_render_target(None);

        r.set_color(1.0, 1.0, 0.0, Some(1.0));
        r.draw_circle(32.0, 32.0, 32.0);
        r.set_color(1.0, 0.0, 0.0, Some(1.0));
        r.draw_rect(5.0, 0.0, 10.0, 10.0);

        r.set_render_target(None);
        r.set_color_value(Color::WHITE);
        r.push();
        r.translate(200.0, 40.0);
        r.set_shader(Some(&assets.grayscale));
        let offset = (self.time * 30.0) % 100.0;
        r.draw_render_target(&assets.target, offset, 0.0);
        r.pop();
        r.set_shader(None);
    }
}

impl Scene for ShapesScene {
    fn name(&self) -> &str {
        "shapes"
    }

    fn init(&mut self, ctx: &mut InitCtx<'_>) -> Result<()> {
        log::info!("init shapes");
        let r = &mut *ctx.renderer;

        let checker = r.create_texture(32, 32, &checker(32, 8));
        let grayscale = r.create_shader(ShaderDesc::new("grayscale", GRAYSCALE_SHADER).with_uniform("level"))?;
        r.set_uniform(&grayscale, "level", UniformValue::Float(1.0))?;
        let target = r.create_render_target(64, 64);
        let sound = ctx.audio.load_sound("sounds/cast_hero.wav");

        self.assets = Some(Assets { checker, grayscale, target, sound });
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) {
        self.time += ctx.dt;
        let Some(assets) = &self.assets else { return };
        let (input, audio) = (ctx.input, &mut *ctx.audio);

        if input.key_hit(Key::Space) {
            log::debug!("channel {SFX_CHANNEL}: {:?}", audio.channel_state(SFX_CHANNEL));
            let options = SoundOptions { looped: true, ..SoundOptions::on_channel(SFX_CHANNEL) };
            audio.play_sound(&assets.sound, options);
        }

        if input.mouse_hit(MouseButton::Left) {
            log::debug!("fade out, {:?}", audio.channel_state(SFX_CHANNEL));
            audio.fade_channel(SFX_CHANNEL, 0.0, FADE_SECONDS, FadeCurve::Linear);
        } else if input.mouse_hit(MouseButton::Right) {
            log::debug!("fade in, {:?}", audio.channel_state(SFX_CHANNEL));
            audio.fade_channel(SFX_CHANNEL, 1.0, FADE_SECONDS, FadeCurve::Linear);
        }
    }

    fn render(&mut self, r: &mut Renderer) {
        let Some(assets) = &self.assets else { return };

        self.draw_basic(r, assets.checker);
        self.draw_shapes(r);
        self.draw_translated(r);
        self.draw_to_texture(r, assets);
    }

    fn clear_color(&self) -> Color {
        rgba(0.5, 0.5, 0.5, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_engine::audio::Audio;
    use kiln_engine::render::{HeadlessBackend, RendererConfig};

    #[test]
    fn checker_alternates_cells() {
        let px = checker(4, 2);
        assert_eq!(px.len(), 4 * 4 * 4);
        assert_eq!(&px[0..4], &[230, 200, 60, 255]);
        // (2, 0) is the next cell over
        assert_eq!(&px[8..12], &[60, 40, 120, 255]);
    }

    #[test]
    fn renders_headless() {
        let mut r = Renderer::new(Box::new(HeadlessBackend::new()), RendererConfig::default());
        let mut audio = Audio::new();
        let mut scene = ShapesScene::default();
        scene.init(&mut InitCtx { renderer: &mut r, audio: &mut audio }).unwrap();

        r.begin_frame(scene.clear_color());
        scene.render(&mut r);
        r.end_frame();

        assert!(r.metrics().draw_calls >= 4);
        assert_eq!(r.transform(), &kiln_engine::render::Transform::IDENTITY);
    }
}
