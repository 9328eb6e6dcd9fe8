use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crate::coords::Rect;
use crate::paint::Color;

use super::backend::{DrawCall, RenderBackend, ShaderDesc, ShaderId, TextureId};
use super::transform::{Transform, TransformStack, MAX_TRANSFORM_STACK_DEPTH};
use super::{BlendMode, RenderError, RenderMetrics, Vertex};

/// Renderer construction parameters.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Virtual screen width in pixels.
    pub width: u32,
    /// Virtual screen height in pixels.
    pub height: u32,
    /// Triangles a batch holds before it is flushed.
    pub max_triangles: usize,
    pub max_transform_depth: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 340,
            height: 220,
            max_triangles: 1024,
            max_transform_depth: MAX_TRANSFORM_STACK_DEPTH,
        }
    }
}

/// Stable handle into the renderer's texture table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

/// Lifecycle of a texture slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureState {
    /// Decoding in the background; the 1×1 white placeholder is bound.
    Loading,
    Ready,
    Failed(String),
    Released,
}

/// Offscreen color target. Its texture can be drawn like any other.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    texture: TextureHandle,
    width: u32,
    height: u32,
}

impl RenderTarget {
    #[inline]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Handle to a compiled custom shader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Shader(u32);

/// Value accepted by [`Renderer::set_uniform`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Texture { texture: TextureHandle, unit: u32 },
}

struct TextureEntry {
    gpu: TextureId,
    width: u32,
    height: u32,
    state: TextureState,
    source: Option<PathBuf>,
}

struct ShaderEntry {
    id: ShaderId,
    label: String,
    names: Vec<String>,
    values: Vec<[f32; 4]>,
    aux_name: Option<String>,
    aux: Option<TextureHandle>,
}

/// Result of a background decode.
struct TextureLoad {
    handle: TextureHandle,
    result: Result<image::RgbaImage, String>,
}

const WHITE_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// Immediate-mode batched 2D renderer.
///
/// Draw calls append transformed, colored vertices to a CPU buffer. The
/// buffer is handed to the backend as one draw on [`flush`](Self::flush),
/// which happens implicitly whenever the pending vertices could no longer
/// be drawn with a single state (texture, blend, shader, target, uniforms)
/// or the buffer is full.
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    config: RendererConfig,

    vertices: Vec<Vertex>,
    max_vertices: usize,

    // state
    textured: bool,
    texture: Option<TextureHandle>,
    color: Color,
    blend: BlendMode,
    shader: Option<Shader>,
    target: Option<RenderTarget>,
    transforms: TransformStack,

    // assets
    textures: Vec<TextureEntry>,
    shaders: Vec<ShaderEntry>,
    /// Released during a frame; destroyed once the frame is submitted.
    pending_release: Vec<TextureId>,
    load_tx: Sender<TextureLoad>,
    load_rx: Receiver<TextureLoad>,

    // metrics
    metrics: RenderMetrics,
    frame_start: Option<Instant>,
}

impl Renderer {
    pub fn new(backend: Box<dyn RenderBackend>, config: RendererConfig) -> Self {
        let max_vertices = config.max_triangles.max(1) * 3;
        let (load_tx, load_rx) = mpsc::channel();
        Self {
            backend,
            vertices: Vec::with_capacity(max_vertices),
            max_vertices,
            textured: false,
            texture: None,
            color: Color::WHITE,
            blend: BlendMode::Alpha,
            shader: None,
            target: None,
            transforms: TransformStack::new(config.max_transform_depth),
            textures: Vec::new(),
            shaders: Vec::new(),
            pending_release: Vec::new(),
            load_tx,
            load_rx,
            metrics: RenderMetrics::default(),
            frame_start: None,
            config,
        }
    }

    /// Virtual screen size in pixels.
    #[inline]
    pub fn resolution(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    #[inline]
    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    /// Vertices waiting for the next flush.
    #[inline]
    pub fn pending_vertices(&self) -> usize {
        self.vertices.len()
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Starts a frame: resets metrics and state, clears the screen.
    pub fn begin_frame(&mut self, clear: Color) {
        self.metrics.draw_calls = 0;
        self.metrics.triangle_count = 0;
        if let Some(ms) = self.backend.poll_gpu_time_ms() {
            self.metrics.gpu_frame_time = ms;
        }
        self.frame_start = Some(Instant::now());

        self.vertices.clear();
        self.textured = false;
        self.texture = None;
        self.color = Color::WHITE;
        self.blend = BlendMode::Alpha;
        self.shader = None;
        self.target = None;
        self.transforms.reset();

        self.backend.begin_frame(clear);
    }

    pub fn end_frame(&mut self) {
        self.flush();
        if let Some(start) = self.frame_start.take() {
            self.metrics.cpu_frame_time = start.elapsed().as_secs_f32() * 1000.0;
        }
        self.backend.end_frame();
        for id in self.pending_release.drain(..) {
            self.backend.destroy_texture(id);
        }
    }

    /// Issues the pending vertices as one backend draw. No-op when empty.
    pub fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }

        let texture = if self.textured {
            self.texture.and_then(|h| self.live_texture(h))
        } else {
            None
        };
        let target = self.target.and_then(|rt| self.live_texture(rt.texture));
        let (shader, uniforms, aux_texture) = match self.shader {
            Some(s) => {
                let entry = &self.shaders[s.0 as usize];
                let aux = entry.aux.and_then(|h| self.live_texture(h));
                (Some(entry.id), entry.values.as_slice(), aux)
            }
            None => (None, &[][..], None),
        };

        self.backend.draw(&DrawCall {
            vertices: &self.vertices,
            blend: self.blend,
            texture,
            shader,
            uniforms,
            aux_texture,
            target,
        });

        self.metrics.draw_calls += 1;
        self.metrics.triangle_count += (self.vertices.len() / 3) as u32;
        self.vertices.clear();
        self.textured = false;
    }

    // ── low level ─────────────────────────────────────────────────────────

    /// Untextured triangle. Positions go through the current transform,
    /// colors are taken per vertex (the current color is not applied).
    pub fn draw_triangle(&mut self, a: Vertex, b: Vertex, c: Vertex) {
        if self.textured {
            self.flush();
        }
        self.reserve_triangle();
        let t = *self.transforms.current();
        for v in [a, b, c] {
            self.vertices.push(Vertex::new(transform_pos(&t, v.pos), v.color, [0.0, 0.0]));
        }
    }

    pub fn draw_triangle_textured(&mut self, tex: TextureHandle, a: Vertex, b: Vertex, c: Vertex) {
        self.reserve_triangle();
        if !self.textured || self.texture != Some(tex) {
            self.flush();
            self.textured = true;
            self.texture = Some(tex);
        }
        let t = *self.transforms.current();
        for v in [a, b, c] {
            self.vertices.push(Vertex::new(transform_pos(&t, v.pos), v.color, v.uv));
        }
    }

    /// Quad `a b c d` as triangles `(a, b, c)` and `(a, c, d)`.
    pub fn draw_quad(&mut self, a: Vertex, b: Vertex, c: Vertex, d: Vertex) {
        self.draw_triangle(a, b, c);
        self.draw_triangle(a, c, d);
    }

    pub fn draw_quad_textured(&mut self, tex: TextureHandle, a: Vertex, b: Vertex, c: Vertex, d: Vertex) {
        self.draw_triangle_textured(tex, a, b, c);
        self.draw_triangle_textured(tex, a, c, d);
    }

    fn reserve_triangle(&mut self) {
        if self.vertices.len() + 3 > self.max_vertices {
            let textured = self.textured;
            self.flush();
            self.textured = textured;
        }
    }

    // ── state ─────────────────────────────────────────────────────────────

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        if mode == self.blend {
            return;
        }
        self.flush();
        self.blend = mode;
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Sets the color used by the shape helpers. `None` keeps the alpha.
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: Option<f32>) {
        self.color = Color::new(r, g, b, a.unwrap_or(self.color.a));
    }

    pub fn set_color_value(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_alpha(&mut self, a: f32) {
        self.color.a = a;
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    // ── shapes ────────────────────────────────────────────────────────────

    pub fn draw_point(&mut self, x: f32, y: f32) {
        self.draw_rect(x, y, 1.0, 1.0);
    }

    pub fn draw_tri(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        let c = self.color;
        self.draw_triangle(
            Vertex::colored(x1, y1, c),
            Vertex::colored(x2, y2, c),
            Vertex::colored(x3, y3, c),
        );
    }

    pub fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let c = self.color;
        self.draw_triangle(
            Vertex::colored(x, y, c),
            Vertex::colored(x + w, y, c),
            Vertex::colored(x, y + h, c),
        );
        self.draw_triangle(
            Vertex::colored(x + w, y, c),
            Vertex::colored(x + w, y + h, c),
            Vertex::colored(x, y + h, c),
        );
    }

    /// Circle with 32 segments.
    pub fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        self.draw_circle_segments(cx, cy, radius, 32);
    }

    /// Triangle fan around `(cx, cy)` starting at angle 0. At least 3 segments.
    pub fn draw_circle_segments(&mut self, cx: f32, cy: f32, radius: f32, segments: u32) {
        let segments = segments.max(3);
        let step = std::f32::consts::TAU / segments as f32;
        let mut prev = (cx + radius, cy);
        for i in 1..=segments {
            let angle = i as f32 * step;
            let next = (cx + angle.cos() * radius, cy + angle.sin() * radius);
            self.draw_tri(cx, cy, prev.0, prev.1, next.0, next.1);
            prev = next;
        }
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Draws the whole texture with its top-left corner at `(x, y)`.
    pub fn draw_tex(&mut self, tex: TextureHandle, x: f32, y: f32) {
        let (w, h) = self.texture_size(tex);
        let (w, h) = (w as f32, h as f32);
        let c = self.color;
        self.draw_triangle_textured(
            tex,
            Vertex::textured(x, y, c, 0.0, 0.0),
            Vertex::textured(x + w, y, c, 1.0, 0.0),
            Vertex::textured(x, y + h, c, 0.0, 1.0),
        );
        self.draw_triangle_textured(
            tex,
            Vertex::textured(x + w, y, c, 1.0, 0.0),
            Vertex::textured(x + w, y + h, c, 1.0, 1.0),
            Vertex::textured(x, y + h, c, 0.0, 1.0),
        );
    }

    /// Draws the source region `(sx, sy, sw, sh)` of `tex` at `(x, y)` in
    /// its natural size. The region is clamped to the texture; an empty
    /// region draws nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_tex_rect(&mut self, tex: TextureHandle, x: f32, y: f32, sx: f32, sy: f32, sw: f32, sh: f32) {
        let (tw, th) = self.texture_size(tex);
        let (tw, th) = (tw as f32, th as f32);
        let src = Rect::new(sx, sy, sw, sh).clamped_to(tw, th);
        if src.is_empty() {
            return;
        }
        let Some((u1, v1, u2, v2)) = src.uv_in(tw, th) else { return };

        let c = self.color;
        self.draw_quad_textured(
            tex,
            Vertex::textured(x, y, c, u1, v1),
            Vertex::textured(x + src.w, y, c, u2, v1),
            Vertex::textured(x + src.w, y + src.h, c, u2, v2),
            Vertex::textured(x, y + src.h, c, u1, v2),
        );
    }

    /// Like [`draw_tex_rect`](Self::draw_tex_rect) with the source as a [`Rect`].
    pub fn draw_tex_region(&mut self, tex: TextureHandle, x: f32, y: f32, src: Rect) {
        self.draw_tex_rect(tex, x, y, src.x, src.y, src.w, src.h);
    }

    pub fn draw_render_target(&mut self, rt: &RenderTarget, x: f32, y: f32) {
        self.draw_tex(rt.texture, x, y);
    }

    /// Creates a ready texture from RGBA8 pixels.
    ///
    /// # Panics
    /// When `rgba.len() != width * height * 4`.
    pub fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureHandle {
        assert_eq!(
            rgba.len(),
            width as usize * height as usize * 4,
            "texture data does not match {width}x{height} RGBA8"
        );
        let gpu = self.backend.create_texture(width, height, rgba);
        self.push_texture(TextureEntry {
            gpu,
            width,
            height,
            state: TextureState::Ready,
            source: None,
        })
    }

    /// Starts loading an image file and returns its handle immediately.
    ///
    /// Until the decode completes the handle is a 1×1 white texture reporting
    /// a size of 0×0. Completions are applied by
    /// [`pump_texture_loads`](Self::pump_texture_loads).
    pub fn load_tex(&mut self, path: impl AsRef<Path>) -> TextureHandle {
        let path = path.as_ref().to_path_buf();
        let handle = self.push_placeholder(Some(path.clone()));

        let tx = self.load_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("kiln-texture-loader".to_string())
            .spawn(move || {
                let result = std::fs::read(&path)
                    .map_err(|e| format!("read {}: {e}", path.display()))
                    .and_then(|bytes| decode_rgba(&bytes));
                // Receiver gone means the renderer was dropped.
                let _ = tx.send(TextureLoad { handle, result });
            });

        if let Err(e) = spawned {
            self.fail_texture(handle, format!("spawn loader thread: {e}"));
        }
        handle
    }

    /// Like [`load_tex`](Self::load_tex) for an encoded image already in memory.
    pub fn load_tex_from_memory(&mut self, bytes: Vec<u8>) -> TextureHandle {
        let handle = self.push_placeholder(None);

        let tx = self.load_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("kiln-texture-loader".to_string())
            .spawn(move || {
                let result = decode_rgba(&bytes);
                let _ = tx.send(TextureLoad { handle, result });
            });

        if let Err(e) = spawned {
            self.fail_texture(handle, format!("spawn loader thread: {e}"));
        }
        handle
    }

    /// Applies finished background decodes. Returns how many were applied.
    pub fn pump_texture_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(load) = self.load_rx.try_recv() {
            let idx = load.handle.0 as usize;
            if self.textures[idx].state != TextureState::Loading {
                log::debug!("texture {idx}: dropping completion for {:?} slot", self.textures[idx].state);
                continue;
            }
            match load.result {
                Ok(img) => {
                    let (w, h) = img.dimensions();
                    if self.textured && self.texture == Some(load.handle) {
                        self.flush();
                    }
                    let gpu = self.textures[idx].gpu;
                    self.backend.update_texture(gpu, w, h, img.as_raw());
                    let entry = &mut self.textures[idx];
                    entry.width = w;
                    entry.height = h;
                    entry.state = TextureState::Ready;
                    log::info!("texture {idx} loaded ({w}x{h}) from {}", describe_source(&entry.source));
                    applied += 1;
                }
                Err(msg) => self.fail_texture(load.handle, msg),
            }
        }
        applied
    }

    /// True while any texture is still decoding.
    pub fn textures_pending(&self) -> bool {
        self.textures.iter().any(|t| t.state == TextureState::Loading)
    }

    pub fn texture_state(&self, tex: TextureHandle) -> &TextureState {
        &self.textures[tex.0 as usize].state
    }

    /// Size in pixels; 0×0 while loading, after a failure, or after release.
    pub fn texture_size(&self, tex: TextureHandle) -> (u32, u32) {
        let entry = &self.textures[tex.0 as usize];
        match entry.state {
            TextureState::Ready => (entry.width, entry.height),
            _ => (0, 0),
        }
    }

    /// Frees the GPU texture. The handle stays valid and reports `Released`.
    ///
    /// Inside a frame the backend texture lives until [`end_frame`](Self::end_frame)
    /// has submitted the draws that may still sample it.
    pub fn release_texture(&mut self, tex: TextureHandle) {
        let idx = tex.0 as usize;
        if self.textures[idx].state == TextureState::Released {
            return;
        }
        if self.texture == Some(tex) || self.target.is_some_and(|rt| rt.texture == tex) {
            self.flush();
        }
        self.textures[idx].state = TextureState::Released;
        let gpu = self.textures[idx].gpu;
        if self.frame_start.is_some() {
            self.pending_release.push(gpu);
        } else {
            self.backend.destroy_texture(gpu);
        }
    }

    fn push_texture(&mut self, entry: TextureEntry) -> TextureHandle {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(entry);
        handle
    }

    fn push_placeholder(&mut self, source: Option<PathBuf>) -> TextureHandle {
        let gpu = self.backend.create_texture(1, 1, &WHITE_PIXEL);
        self.push_texture(TextureEntry {
            gpu,
            width: 0,
            height: 0,
            state: TextureState::Loading,
            source,
        })
    }

    fn fail_texture(&mut self, tex: TextureHandle, msg: String) {
        let entry = &mut self.textures[tex.0 as usize];
        log::warn!("texture {} failed to load from {}: {msg}", tex.0, describe_source(&entry.source));
        entry.state = TextureState::Failed(msg);
    }

    fn live_texture(&self, tex: TextureHandle) -> Option<TextureId> {
        let entry = &self.textures[tex.0 as usize];
        (entry.state != TextureState::Released).then_some(entry.gpu)
    }

    // ── render targets ────────────────────────────────────────────────────

    pub fn create_render_target(&mut self, width: u32, height: u32) -> RenderTarget {
        let gpu = self.backend.create_render_target(width, height);
        let texture = self.push_texture(TextureEntry {
            gpu,
            width,
            height,
            state: TextureState::Ready,
            source: None,
        });
        RenderTarget { texture, width, height }
    }

    /// Redirects drawing to `rt`, or back to the screen for `None`.
    pub fn set_render_target(&mut self, rt: Option<&RenderTarget>) {
        let rt = rt.copied();
        if rt == self.target {
            return;
        }
        self.flush();
        self.target = rt;
    }

    #[inline]
    pub fn render_target(&self) -> Option<RenderTarget> {
        self.target
    }

    /// Clears the current target. `None` clears to opaque black.
    pub fn clear_render_target(&mut self, color: Option<Color>) {
        self.flush();
        let target = self.target.and_then(|rt| self.live_texture(rt.texture));
        self.backend.clear(target, color.unwrap_or(Color::BLACK));
    }

    // ── shaders ───────────────────────────────────────────────────────────

    pub fn create_shader(&mut self, desc: ShaderDesc) -> Result<Shader, RenderError> {
        desc.validate()?;
        let id = self.backend.create_shader(&desc)?;
        log::debug!("shader {:?} created with uniforms {:?}", desc.label, desc.uniforms);

        let handle = Shader(self.shaders.len() as u32);
        self.shaders.push(ShaderEntry {
            id,
            values: vec![[0.0; 4]; desc.uniforms.len()],
            names: desc.uniforms,
            label: desc.label,
            aux_name: desc.aux_texture,
            aux: None,
        });
        Ok(handle)
    }

    /// Selects a custom shader, or the default batch shader for `None`.
    pub fn set_shader(&mut self, shader: Option<&Shader>) {
        let shader = shader.copied();
        if shader == self.shader {
            return;
        }
        self.flush();
        self.shader = shader;
    }

    #[inline]
    pub fn shader(&self) -> Option<Shader> {
        self.shader
    }

    /// Sets a uniform of `shader`.
    ///
    /// Pending vertices drawn with `shader` are flushed first so they keep
    /// the values they were drawn with.
    pub fn set_uniform(&mut self, shader: &Shader, name: &str, value: UniformValue) -> Result<(), RenderError> {
        let idx = shader.0 as usize;

        let slot = match value {
            UniformValue::Texture { unit, .. } => {
                if unit != 1 {
                    return Err(RenderError::TextureUnit { name: name.to_string(), unit });
                }
                if self.shaders[idx].aux_name.as_deref() != Some(name) {
                    return Err(self.unknown_uniform(idx, name));
                }
                None
            }
            _ => match self.shaders[idx].names.iter().position(|n| n == name) {
                Some(slot) => Some(slot),
                None => return Err(self.unknown_uniform(idx, name)),
            },
        };

        if self.shader == Some(*shader) {
            self.flush();
        }

        let entry = &mut self.shaders[idx];
        match (value, slot) {
            (UniformValue::Texture { texture, .. }, _) => entry.aux = Some(texture),
            (UniformValue::Float(v), Some(slot)) => entry.values[slot] = [v, 0.0, 0.0, 0.0],
            (UniformValue::Vec2([x, y]), Some(slot)) => entry.values[slot] = [x, y, 0.0, 0.0],
            (UniformValue::Vec3([x, y, z]), Some(slot)) => entry.values[slot] = [x, y, z, 0.0],
            (UniformValue::Vec4(v), Some(slot)) => entry.values[slot] = v,
            (_, None) => {}
        }
        Ok(())
    }

    fn unknown_uniform(&self, idx: usize, name: &str) -> RenderError {
        RenderError::UnknownUniform {
            label: self.shaders[idx].label.clone(),
            name: name.to_string(),
        }
    }

    // ── transforms ────────────────────────────────────────────────────────

    pub fn translate(&mut self, x: f32, y: f32) {
        self.transforms.translate(x, y);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.transforms.scale(x, y);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.transforms.rotate(angle);
    }

    pub fn apply_transform(&mut self, t: &Transform) {
        self.transforms.apply(t);
    }

    /// # Panics
    /// When the configured transform depth is exceeded.
    pub fn push(&mut self) {
        self.transforms.push();
    }

    pub fn pop(&mut self) {
        self.transforms.pop();
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        self.transforms.current()
    }
}

#[inline]
fn transform_pos(t: &Transform, pos: [f32; 2]) -> [f32; 2] {
    let (x, y) = t.apply_point(pos[0], pos[1]);
    [x, y]
}

fn decode_rgba(bytes: &[u8]) -> Result<image::RgbaImage, String> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("decode: {e}"))
}

fn describe_source(source: &Option<PathBuf>) -> String {
    match source {
        Some(p) => p.display().to_string(),
        None => "memory".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::render::headless::{BackendCall, CallLog, HeadlessBackend};

    fn renderer() -> (Renderer, CallLog) {
        renderer_with(RendererConfig::default())
    }

    fn renderer_with(config: RendererConfig) -> (Renderer, CallLog) {
        let (backend, log) = HeadlessBackend::with_log();
        (Renderer::new(Box::new(backend), config), log)
    }

    fn checker_texture(r: &mut Renderer, w: u32, h: u32) -> TextureHandle {
        r.create_texture(w, h, &vec![200u8; (w * h * 4) as usize])
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn wait_for_loads(r: &mut Renderer) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while r.textures_pending() && Instant::now() < deadline {
            r.pump_texture_loads();
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn flush_without_vertices_issues_nothing() {
        let (mut r, log) = renderer();
        r.begin_frame(Color::BLACK);
        r.flush();
        assert!(log.draws().is_empty());
        assert_eq!(r.metrics().draw_calls, 0);
    }

    #[test]
    fn quad_equals_two_triangles() {
        let (mut a, log_a) = renderer();
        let (mut b, log_b) = renderer();
        let c = Color::RED;
        let v = [
            Vertex::colored(0.0, 0.0, c),
            Vertex::colored(10.0, 0.0, c),
            Vertex::colored(10.0, 10.0, c),
            Vertex::colored(0.0, 10.0, c),
        ];

        a.begin_frame(Color::BLACK);
        a.draw_quad(v[0], v[1], v[2], v[3]);
        a.end_frame();

        b.begin_frame(Color::BLACK);
        b.draw_triangle(v[0], v[1], v[2]);
        b.draw_triangle(v[0], v[2], v[3]);
        b.end_frame();

        assert_eq!(log_a.draws(), log_b.draws());
        assert_eq!(a.metrics().triangle_count, 2);
    }

    #[test]
    fn batch_overflow_flushes_and_keeps_everything() {
        let (mut r, log) = renderer_with(RendererConfig { max_triangles: 4, ..Default::default() });
        r.begin_frame(Color::BLACK);
        for i in 0..5 {
            r.draw_tri(i as f32, 0.0, 1.0, 0.0, 0.0, 1.0);
        }
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].vertices.len(), 12);
        assert_eq!(draws[1].vertices.len(), 3);
        assert_eq!(r.metrics().triangle_count, 5);
        assert_eq!(r.metrics().draw_calls, 2);
    }

    #[test]
    fn textured_overflow_keeps_texture_bound() {
        let (mut r, log) = renderer_with(RendererConfig { max_triangles: 2, ..Default::default() });
        let tex = checker_texture(&mut r, 4, 4);
        r.begin_frame(Color::BLACK);
        r.draw_tex(tex, 0.0, 0.0);
        r.draw_tex(tex, 4.0, 0.0);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 2);
        assert!(draws.iter().all(|d| d.texture.is_some()));
    }

    #[test]
    fn switching_texture_state_flushes() {
        let (mut r, log) = renderer();
        let t1 = checker_texture(&mut r, 4, 4);
        let t2 = checker_texture(&mut r, 4, 4);

        r.begin_frame(Color::BLACK);
        r.draw_rect(0.0, 0.0, 2.0, 2.0);
        r.draw_tex(t1, 0.0, 0.0);
        r.draw_tex(t1, 5.0, 0.0);
        r.draw_tex(t2, 0.0, 0.0);
        r.draw_rect(0.0, 0.0, 2.0, 2.0);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[0].texture, None);
        assert_eq!(draws[1].vertices.len(), 12);
        assert_ne!(draws[1].texture, draws[2].texture);
        assert_eq!(draws[3].texture, None);
    }

    #[test]
    fn blend_change_flushes_only_on_change() {
        let (mut r, log) = renderer();
        r.begin_frame(Color::BLACK);
        r.draw_point(0.0, 0.0);
        r.set_blend_mode(BlendMode::Alpha);
        r.draw_point(1.0, 0.0);
        r.set_blend_mode(BlendMode::Additive);
        r.draw_point(2.0, 0.0);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].blend, BlendMode::Alpha);
        assert_eq!(draws[1].blend, BlendMode::Additive);
    }

    #[test]
    fn begin_frame_resets_state_and_metrics() {
        let (mut r, _log) = renderer();
        r.begin_frame(Color::BLACK);
        r.set_color(1.0, 0.0, 0.0, Some(0.5));
        r.set_blend_mode(BlendMode::Multiply);
        r.translate(5.0, 5.0);
        r.push();
        r.draw_point(0.0, 0.0);
        r.end_frame();
        assert_eq!(r.metrics().draw_calls, 1);

        r.begin_frame(Color::BLACK);
        assert_eq!(r.color(), Color::WHITE);
        assert_eq!(r.blend_mode(), BlendMode::Alpha);
        assert_eq!(*r.transform(), Transform::IDENTITY);
        assert_eq!(r.metrics().draw_calls, 0);
        assert_eq!(r.metrics().triangle_count, 0);
    }

    #[test]
    fn gpu_time_is_taken_from_backend_at_begin_frame() {
        let mut backend = HeadlessBackend::new();
        backend.report_gpu_time(2.5);
        let mut r = Renderer::new(Box::new(backend), RendererConfig::default());
        r.begin_frame(Color::BLACK);
        assert_eq!(r.metrics().gpu_frame_time, 2.5);
        r.end_frame();
        r.begin_frame(Color::BLACK);
        assert_eq!(r.metrics().gpu_frame_time, 2.5);
    }

    // ── color & shapes ────────────────────────────────────────────────────

    #[test]
    fn set_color_without_alpha_keeps_alpha() {
        let (mut r, _log) = renderer();
        r.set_color(1.0, 1.0, 1.0, Some(0.25));
        r.set_color(0.0, 0.5, 1.0, None);
        assert_eq!(r.color(), Color::new(0.0, 0.5, 1.0, 0.25));
        r.set_alpha(0.75);
        assert_eq!(r.color().a, 0.75);
    }

    #[test]
    fn rect_vertices_follow_transform() {
        let (mut r, log) = renderer();
        r.begin_frame(Color::BLACK);
        r.translate(100.0, 50.0);
        r.draw_rect(0.0, 0.0, 10.0, 20.0);
        r.end_frame();

        let positions: Vec<[f32; 2]> = log.draws()[0].vertices.iter().map(|v| v.pos).collect();
        assert_eq!(
            positions,
            vec![
                [100.0, 50.0],
                [110.0, 50.0],
                [100.0, 70.0],
                [110.0, 50.0],
                [110.0, 70.0],
                [100.0, 70.0],
            ]
        );
    }

    #[test]
    fn circle_segments_are_clamped_to_three() {
        let (mut r, _log) = renderer();
        r.begin_frame(Color::BLACK);
        r.draw_circle_segments(0.0, 0.0, 5.0, 1);
        r.end_frame();
        assert_eq!(r.metrics().triangle_count, 3);

        r.begin_frame(Color::BLACK);
        r.draw_circle(0.0, 0.0, 5.0);
        r.end_frame();
        assert_eq!(r.metrics().triangle_count, 32);
    }

    #[test]
    fn draw_tex_rect_clamps_source() {
        let (mut r, log) = renderer();
        let tex = checker_texture(&mut r, 40, 20);
        r.begin_frame(Color::BLACK);
        r.draw_tex_rect(tex, 0.0, 0.0, 30.0, 10.0, 20.0, 20.0);
        r.end_frame();

        let v = &log.draws()[0].vertices;
        // width clamped to 10, height to 10
        assert_eq!(v[2].pos, [10.0, 10.0]);
        assert_eq!(v[0].uv, [0.75, 0.5]);
        assert_eq!(v[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn draw_tex_rect_empty_source_draws_nothing() {
        let (mut r, log) = renderer();
        let tex = checker_texture(&mut r, 20, 20);
        r.begin_frame(Color::BLACK);
        r.draw_tex_rect(tex, 0.0, 0.0, 20.0, 0.0, 5.0, 5.0);
        r.end_frame();
        assert!(log.draws().is_empty());
    }

    // ── textures ──────────────────────────────────────────────────────────

    #[test]
    fn loaded_texture_is_zero_sized_until_pumped() {
        let (mut r, log) = renderer();
        let tex = r.load_tex_from_memory(png_bytes(8, 4));
        assert_eq!(*r.texture_state(tex), TextureState::Loading);
        assert_eq!(r.texture_size(tex), (0, 0));

        wait_for_loads(&mut r);
        assert_eq!(*r.texture_state(tex), TextureState::Ready);
        assert_eq!(r.texture_size(tex), (8, 4));
        assert!(log
            .calls()
            .iter()
            .any(|c| matches!(c, BackendCall::UpdateTexture { width: 8, height: 4, .. })));
    }

    #[test]
    fn undecodable_image_marks_failure() {
        let (mut r, _log) = renderer();
        let tex = r.load_tex_from_memory(b"not an image".to_vec());
        wait_for_loads(&mut r);
        assert!(matches!(r.texture_state(tex), TextureState::Failed(_)));
        assert_eq!(r.texture_size(tex), (0, 0));
    }

    #[test]
    fn missing_file_marks_failure() {
        let (mut r, _log) = renderer();
        let tex = r.load_tex("definitely/not/here.png");
        wait_for_loads(&mut r);
        assert!(matches!(r.texture_state(tex), TextureState::Failed(_)));
    }

    #[test]
    fn completion_for_released_texture_is_ignored() {
        let (mut r, log) = renderer();
        let tex = r.load_tex_from_memory(png_bytes(2, 2));
        r.release_texture(tex);

        for _ in 0..100 {
            assert_eq!(r.pump_texture_loads(), 0);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(*r.texture_state(tex), TextureState::Released);
        assert!(!log.calls().iter().any(|c| matches!(c, BackendCall::UpdateTexture { .. })));
    }

    #[test]
    fn release_mid_frame_destroys_after_submit() {
        let (mut r, log) = renderer();
        let tex = checker_texture(&mut r, 2, 2);
        r.begin_frame(Color::BLACK);
        r.draw_tex(tex, 0.0, 0.0);
        r.release_texture(tex);
        assert_eq!(log.draws().len(), 1);
        assert!(!log.calls().iter().any(|c| matches!(c, BackendCall::DestroyTexture(_))));
        r.end_frame();

        let calls = log.calls();
        let end = calls.iter().position(|c| *c == BackendCall::EndFrame).unwrap();
        assert!(matches!(calls[end + 1], BackendCall::DestroyTexture(_)));
        assert_eq!(*r.texture_state(tex), TextureState::Released);
    }

    #[test]
    fn release_outside_frame_destroys_at_once() {
        let (mut r, log) = renderer();
        let tex = checker_texture(&mut r, 2, 2);
        r.release_texture(tex);
        assert!(matches!(log.calls().last(), Some(BackendCall::DestroyTexture(_))));
    }

    // ── targets & shaders ─────────────────────────────────────────────────

    #[test]
    fn render_target_switch_and_clear_flush() {
        let (mut r, log) = renderer();
        let rt = r.create_render_target(32, 16);
        r.begin_frame(Color::BLACK);
        r.draw_point(0.0, 0.0);
        r.set_render_target(Some(&rt));
        r.clear_render_target(Some(Color::WHITE));
        r.draw_point(1.0, 1.0);
        r.set_render_target(None);
        r.draw_render_target(&rt, 0.0, 0.0);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].target, None);
        assert!(draws[1].target.is_some());
        assert_eq!(draws[2].texture, draws[1].target);
        assert_eq!(draws[2].vertices[4].pos, [32.0, 16.0]);

        let calls = log.calls();
        let clear_at = calls.iter().position(|c| matches!(c, BackendCall::Clear { target: Some(_), .. }));
        let second_draw_at = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, BackendCall::Draw(_)))
            .nth(1)
            .map(|(i, _)| i);
        assert!(clear_at < second_draw_at);
    }

    #[test]
    fn clear_defaults_to_black() {
        let (mut r, log) = renderer();
        r.begin_frame(Color::WHITE);
        r.clear_render_target(None);
        assert!(log.calls().contains(&BackendCall::Clear { target: None, color: Color::BLACK }));
    }

    fn light_shader(r: &mut Renderer) -> Shader {
        r.create_shader(
            ShaderDesc::new("light", "@fragment fn fs_main(in: VsOut) -> @location(0) vec4<f32> { return in.color; }")
                .with_uniform("light_pos")
                .with_uniform("radius")
                .with_texture("normals"),
        )
        .unwrap()
    }

    #[test]
    fn uniform_change_on_active_shader_flushes() {
        let (mut r, log) = renderer();
        let s = light_shader(&mut r);
        r.begin_frame(Color::BLACK);
        r.set_shader(Some(&s));
        r.set_uniform(&s, "radius", UniformValue::Float(10.0)).unwrap();
        r.draw_point(0.0, 0.0);
        r.set_uniform(&s, "radius", UniformValue::Float(20.0)).unwrap();
        r.draw_point(0.0, 0.0);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].uniforms[1], [10.0, 0.0, 0.0, 0.0]);
        assert_eq!(draws[1].uniforms[1], [20.0, 0.0, 0.0, 0.0]);
        assert!(draws.iter().all(|d| d.shader.is_some()));
    }

    #[test]
    fn uniform_errors() {
        let (mut r, _log) = renderer();
        let s = light_shader(&mut r);
        let tex = checker_texture(&mut r, 1, 1);
        assert!(matches!(
            r.set_uniform(&s, "nope", UniformValue::Float(1.0)),
            Err(RenderError::UnknownUniform { .. })
        ));
        assert!(matches!(
            r.set_uniform(&s, "normals", UniformValue::Texture { texture: tex, unit: 2 }),
            Err(RenderError::TextureUnit { unit: 2, .. })
        ));
        assert!(r.set_uniform(&s, "normals", UniformValue::Texture { texture: tex, unit: 1 }).is_ok());
    }

    #[test]
    fn invalid_shader_is_an_error() {
        let (mut r, _log) = renderer();
        let err = r.create_shader(ShaderDesc::new("bad", "fn main() {}")).unwrap_err();
        assert!(matches!(err, RenderError::MissingEntryPoint { .. }));
    }
}
