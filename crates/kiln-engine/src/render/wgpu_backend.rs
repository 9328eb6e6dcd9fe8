use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::ops::Range;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;
use crate::paint::Color;

use super::backend::{
    DrawCall, RenderBackend, ShaderDesc, ShaderId, TextureId, MAX_SHADER_UNIFORMS,
};
use super::{BlendMode, RenderError, Vertex};

const PRELUDE: &str = include_str!("shaders/batch_prelude.wgsl");
const DEFAULT_FRAGMENT: &str = include_str!("shaders/batch_default.wgsl");

/// Format of textures and offscreen render targets.
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Size of one per-draw uniform block; also the dynamic offset stride.
const UNIFORM_STRIDE: u64 = 256;

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    resolution: [f32; 4],
    slots: [[f32; 4]; MAX_SHADER_UNIFORMS],
}

const _: () = assert!(std::mem::size_of::<DrawUniforms>() as u64 == UNIFORM_STRIDE);

// ── surface slot ──────────────────────────────────────────────────────────

#[derive(Clone)]
struct SurfaceView {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Where screen draws of the current frame go.
///
/// The window runtime attaches the acquired swapchain view before the engine
/// renders and detaches it before presenting. Screen work recorded while
/// nothing is attached is dropped.
#[derive(Clone, Default)]
pub struct SurfaceSlot(Rc<RefCell<Option<SurfaceView>>>);

impl SurfaceSlot {
    pub fn attach(&self, view: wgpu::TextureView, width: u32, height: u32) {
        *self.0.borrow_mut() = Some(SurfaceView { view, width, height });
    }

    pub fn detach(&self) {
        self.0.borrow_mut().take();
    }

    fn get(&self) -> Option<SurfaceView> {
        self.0.borrow().clone()
    }
}

// ── recorded frame ────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    shader: Option<ShaderId>,
    blend: BlendMode,
    format: wgpu::TextureFormat,
}

enum FrameOp {
    Clear {
        target: Option<TextureId>,
        color: Color,
    },
    Draw {
        target: Option<TextureId>,
        pipeline: PipelineKey,
        texture: Option<TextureId>,
        aux: Option<TextureId>,
        vertices: Range<u32>,
        uniform_block: u32,
    },
}

impl FrameOp {
    fn target(&self) -> Option<TextureId> {
        match self {
            FrameOp::Clear { target, .. } | FrameOp::Draw { target, .. } => *target,
        }
    }
}

/// Consecutive ops that share a target and at most one leading clear.
struct PassSpec {
    target: Option<TextureId>,
    clear: Option<Color>,
    draws: Range<usize>,
}

fn plan_passes(ops: &[FrameOp]) -> Vec<PassSpec> {
    let mut passes = Vec::new();
    let mut i = 0;
    while i < ops.len() {
        let target = ops[i].target();
        let clear = match ops[i] {
            FrameOp::Clear { color, .. } => {
                i += 1;
                Some(color)
            }
            FrameOp::Draw { .. } => None,
        };
        let start = i;
        while i < ops.len() && matches!(ops[i], FrameOp::Draw { .. }) && ops[i].target() == target {
            i += 1;
        }
        passes.push(PassSpec { target, clear, draws: start..i });
    }
    passes
}

// ── gpu resources ─────────────────────────────────────────────────────────

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    render_target: bool,
}

enum TimingSlot {
    Idle,
    Mapping(Receiver<Result<(), wgpu::BufferAsyncError>>),
}

/// Frame timing through a pair of timestamp queries around the frame's
/// passes. Readbacks rotate over a few buffers and are never waited on.
struct GpuTiming {
    query_set: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    readback: Vec<(wgpu::Buffer, TimingSlot)>,
    period_ns: f32,
    latest: Option<f32>,
}

impl GpuTiming {
    const SLOTS: usize = 3;

    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("kiln frame timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        });
        let resolve = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kiln timestamp resolve"),
            size: 16,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = (0..Self::SLOTS)
            .map(|_| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("kiln timestamp readback"),
                    size: 16,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (buffer, TimingSlot::Idle)
            })
            .collect();
        Self {
            query_set,
            resolve,
            readback,
            period_ns: queue.get_timestamp_period(),
            latest: None,
        }
    }

    fn idle_slot(&self) -> Option<usize> {
        self.readback.iter().position(|(_, s)| matches!(s, TimingSlot::Idle))
    }

    fn poll(&mut self, device: &wgpu::Device) {
        let _ = device.poll(wgpu::PollType::Poll);
        for (buffer, slot) in &mut self.readback {
            let TimingSlot::Mapping(rx) = slot else { continue };
            match rx.try_recv() {
                Ok(Ok(())) => {
                    {
                        let mapped = buffer.slice(..).get_mapped_range();
                        let stamps: &[u64] = bytemuck::cast_slice(&mapped);
                        if let [start, end, ..] = stamps {
                            let ticks = end.saturating_sub(*start);
                            self.latest = Some(ticks as f32 * self.period_ns / 1_000_000.0);
                        }
                    }
                    buffer.unmap();
                    *slot = TimingSlot::Idle;
                }
                Ok(Err(e)) => {
                    log::debug!("timestamp readback failed: {e}");
                    *slot = TimingSlot::Idle;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => *slot = TimingSlot::Idle,
            }
        }
    }
}

// ── backend ───────────────────────────────────────────────────────────────

/// [`RenderBackend`] on wgpu.
///
/// Draws are recorded during the frame (vertices into one frame-wide vertex
/// buffer, one 256-byte uniform block per draw) and encoded in
/// [`end_frame`](RenderBackend::end_frame): runs of draws into the same
/// target become one render pass. Screen passes are letterboxed into the
/// attached surface at the virtual resolution's aspect ratio.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    screen_size: (u32, u32),
    surface: SurfaceSlot,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    default_module: wgpu::ShaderModule,
    shader_modules: Vec<wgpu::ShaderModule>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    textures: Vec<Option<GpuTexture>>,
    white: GpuTexture,

    ops: Vec<FrameOp>,
    frame_vertices: Vec<Vertex>,
    frame_uniforms: Vec<DrawUniforms>,

    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: usize,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    uniform_capacity: usize,

    timing: Option<GpuTiming>,
    warned_no_surface: bool,
}

impl WgpuBackend {
    /// `screen_size` is the renderer's virtual resolution; `surface_format`
    /// the format of the views attached through [`surface_slot`](Self::surface_slot).
    ///
    /// GPU frame timing is enabled when the device was created with
    /// `wgpu::Features::TIMESTAMP_QUERY`.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        screen_size: (u32, u32),
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln draw uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_STRIDE),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kiln batch pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout, &texture_layout],
            immediate_size: 0,
        });

        // Pixel art: no filtering between texels.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kiln batch sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let default_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kiln batch shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{PRELUDE}\n{DEFAULT_FRAGMENT}").into()),
        });

        let white = make_texture(&device, &texture_layout, &sampler, 1, 1, false);
        write_pixels(&queue, &white, &[255, 255, 255, 255]);

        let timing = device
            .features()
            .contains(wgpu::Features::TIMESTAMP_QUERY)
            .then(|| GpuTiming::new(&device, &queue));
        if timing.is_none() {
            log::info!("TIMESTAMP_QUERY unavailable; gpu frame time will not be measured");
        }

        Self {
            device,
            queue,
            surface_format,
            screen_size,
            surface: SurfaceSlot::default(),
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            default_module,
            shader_modules: Vec::new(),
            pipelines: HashMap::new(),
            textures: Vec::new(),
            white,
            ops: Vec::new(),
            frame_vertices: Vec::new(),
            frame_uniforms: Vec::new(),
            vertex_buffer: None,
            vertex_capacity: 0,
            uniform_buffer: None,
            uniform_bind_group: None,
            uniform_capacity: 0,
            timing,
            warned_no_surface: false,
        }
    }

    /// Handle through which the runtime attaches the swapchain view.
    pub fn surface_slot(&self) -> SurfaceSlot {
        self.surface.clone()
    }

    fn texture(&self, id: Option<TextureId>) -> &GpuTexture {
        id.and_then(|id| self.textures.get(id.0 as usize))
            .and_then(|t| t.as_ref())
            .unwrap_or(&self.white)
    }

    fn target_size(&self, target: Option<TextureId>) -> (u32, u32) {
        match target {
            None => self.screen_size,
            Some(_) => {
                let t = self.texture(target);
                (t.width, t.height)
            }
        }
    }

    fn alloc(&mut self, tex: GpuTexture) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(Some(tex));
        id
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let module = match key.shader {
            None => &self.default_module,
            Some(id) => match self.shader_modules.get(id.0 as usize) {
                Some(m) => m,
                None => return,
            },
        };

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kiln batch pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: key.blend.to_wgpu(),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.insert(key, pipeline);
    }

    fn upload_frame(&mut self) {
        if !self.frame_vertices.is_empty() {
            if self.vertex_buffer.is_none() || self.frame_vertices.len() > self.vertex_capacity {
                let cap = self.frame_vertices.len().next_power_of_two().max(1024);
                self.vertex_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("kiln frame vertices"),
                    size: (cap * std::mem::size_of::<Vertex>()) as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }));
                self.vertex_capacity = cap;
            }
            if let Some(vb) = &self.vertex_buffer {
                self.queue.write_buffer(vb, 0, bytemuck::cast_slice(&self.frame_vertices));
            }
        }

        if !self.frame_uniforms.is_empty() {
            if self.uniform_buffer.is_none() || self.frame_uniforms.len() > self.uniform_capacity {
                let cap = self.frame_uniforms.len().next_power_of_two().max(64);
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("kiln draw uniforms"),
                    size: cap as u64 * UNIFORM_STRIDE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("kiln draw uniforms bind group"),
                    layout: &self.uniform_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &buffer,
                            offset: 0,
                            size: wgpu::BufferSize::new(UNIFORM_STRIDE),
                        }),
                    }],
                });
                self.uniform_buffer = Some(buffer);
                self.uniform_bind_group = Some(bind_group);
                self.uniform_capacity = cap;
            }
            if let Some(ub) = &self.uniform_buffer {
                self.queue.write_buffer(ub, 0, bytemuck::cast_slice(&self.frame_uniforms));
            }
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        plan: &PassSpec,
        ops: &[FrameOp],
        surface: Option<&SurfaceView>,
        timestamps: Option<wgpu::RenderPassTimestampWrites<'_>>,
    ) {
        let (view, viewport) = match plan.target {
            None => match surface {
                Some(s) => (&s.view, Some(Viewport::letterbox(self.screen_size, (s.width, s.height)))),
                None => return,
            },
            Some(id) => match self.textures.get(id.0 as usize).and_then(|t| t.as_ref()) {
                Some(t) => (&t.view, None),
                None => return,
            },
        };

        let load = match plan.clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: timestamps,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if plan.draws.is_empty() {
            return;
        }
        let (Some(vb), Some(ubg)) = (&self.vertex_buffer, &self.uniform_bind_group) else {
            return;
        };

        if let Some(v) = viewport {
            rpass.set_viewport(v.x, v.y, v.width, v.height, 0.0, 1.0);
        }
        rpass.set_vertex_buffer(0, vb.slice(..));

        for op in &ops[plan.draws.clone()] {
            let FrameOp::Draw { pipeline, texture, aux, vertices, uniform_block, .. } = op else {
                continue;
            };
            let Some(pipeline) = self.pipelines.get(pipeline) else { continue };
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, ubg, &[(*uniform_block as u64 * UNIFORM_STRIDE) as u32]);
            rpass.set_bind_group(1, &self.texture(*texture).bind_group, &[]);
            rpass.set_bind_group(2, &self.texture(*aux).bind_group, &[]);
            rpass.draw(vertices.clone(), 0..1);
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureId {
        let tex = make_texture(&self.device, &self.texture_layout, &self.sampler, width, height, false);
        write_pixels(&self.queue, &tex, rgba);
        self.alloc(tex)
    }

    fn update_texture(&mut self, id: TextureId, width: u32, height: u32, rgba: &[u8]) {
        let Some(slot) = self.textures.get_mut(id.0 as usize) else { return };
        let Some(existing) = slot.as_ref() else { return };
        if existing.width != width.max(1) || existing.height != height.max(1) {
            let tex = make_texture(&self.device, &self.texture_layout, &self.sampler, width, height, existing.render_target);
            *slot = Some(tex);
        }
        if let Some(tex) = slot.as_ref() {
            write_pixels(&self.queue, tex, rgba);
        }
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> TextureId {
        let tex = make_texture(&self.device, &self.texture_layout, &self.sampler, width, height, true);
        self.alloc(tex)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(slot) = self.textures.get_mut(id.0 as usize) {
            if let Some(tex) = slot.take() {
                tex.texture.destroy();
            }
        }
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<ShaderId, RenderError> {
        desc.validate()?;
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&desc.label),
            source: wgpu::ShaderSource::Wgsl(compose_shader_source(desc).into()),
        });
        let id = ShaderId(self.shader_modules.len() as u32);
        self.shader_modules.push(module);
        log::info!("compiled shader {:?}", desc.label);
        Ok(id)
    }

    fn begin_frame(&mut self, clear: Color) {
        self.ops.clear();
        self.frame_vertices.clear();
        self.frame_uniforms.clear();
        self.ops.push(FrameOp::Clear { target: None, color: clear });
    }

    fn clear(&mut self, target: Option<TextureId>, color: Color) {
        self.ops.push(FrameOp::Clear { target, color });
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let format = match call.target {
            None => self.surface_format,
            Some(_) => TEXTURE_FORMAT,
        };
        let key = PipelineKey { shader: call.shader, blend: call.blend, format };
        self.ensure_pipeline(key);

        let (w, h) = self.target_size(call.target);
        let mut block = DrawUniforms {
            resolution: [w as f32, h as f32, 0.0, 0.0],
            slots: [[0.0; 4]; MAX_SHADER_UNIFORMS],
        };
        for (dst, src) in block.slots.iter_mut().zip(call.uniforms) {
            *dst = *src;
        }
        let uniform_block = self.frame_uniforms.len() as u32;
        self.frame_uniforms.push(block);

        let first = self.frame_vertices.len() as u32;
        self.frame_vertices.extend_from_slice(call.vertices);
        let last = self.frame_vertices.len() as u32;

        self.ops.push(FrameOp::Draw {
            target: call.target,
            pipeline: key,
            texture: call.texture,
            aux: call.aux_texture,
            vertices: first..last,
            uniform_block,
        });
    }

    fn end_frame(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        let surface = self.surface.get();
        if surface.is_none() && !self.warned_no_surface {
            log::debug!("no surface attached; screen passes are skipped");
            self.warned_no_surface = true;
        }

        self.upload_frame();

        let passes = plan_passes(&ops);
        let timing_slot = self.timing.as_ref().and_then(|t| t.idle_slot());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kiln frame encoder"),
        });

        let last = passes.len().saturating_sub(1);
        for (i, plan) in passes.iter().enumerate() {
            let timestamps = match (&self.timing, timing_slot) {
                (Some(t), Some(_)) if i == 0 || i == last => Some(wgpu::RenderPassTimestampWrites {
                    query_set: &t.query_set,
                    beginning_of_pass_write_index: (i == 0).then_some(0),
                    end_of_pass_write_index: (i == last).then_some(1),
                }),
                _ => None,
            };
            self.encode_pass(&mut encoder, plan, &ops, surface.as_ref(), timestamps);
        }

        if let (Some(t), Some(slot)) = (&self.timing, timing_slot) {
            encoder.resolve_query_set(&t.query_set, 0..2, &t.resolve, 0);
            encoder.copy_buffer_to_buffer(&t.resolve, 0, &t.readback[slot].0, 0, 16);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        if let (Some(t), Some(slot)) = (&mut self.timing, timing_slot) {
            let (tx, rx) = mpsc::channel();
            t.readback[slot].0.slice(..).map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
            t.readback[slot].1 = TimingSlot::Mapping(rx);
        }

        self.ops = ops;
        self.ops.clear();
    }

    fn poll_gpu_time_ms(&mut self) -> Option<f32> {
        let t = self.timing.as_mut()?;
        t.poll(&self.device);
        t.latest.take()
    }
}

fn make_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    width: u32,
    height: u32,
    render_target: bool,
) -> GpuTexture {
    let (width, height) = (width.max(1), height.max(1));
    let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
    if render_target {
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(if render_target { "kiln render target" } else { "kiln texture" }),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("kiln texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture { texture, view, bind_group, width, height, render_target }
}

fn write_pixels(queue: &wgpu::Queue, tex: &GpuTexture, rgba: &[u8]) {
    let expected = tex.width as usize * tex.height as usize * 4;
    if rgba.len() != expected {
        log::warn!(
            "texture upload skipped: {} bytes for {}x{} RGBA8",
            rgba.len(),
            tex.width,
            tex.height
        );
        return;
    }
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &tex.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(tex.width * 4),
            rows_per_image: Some(tex.height),
        },
        wgpu::Extent3d { width: tex.width, height: tex.height, depth_or_array_layers: 1 },
    );
}

/// Prelude + one `u_<name>()` accessor per declared uniform + the fragment.
fn compose_shader_source(desc: &ShaderDesc) -> String {
    let mut src = String::with_capacity(PRELUDE.len() + desc.fragment.len() + 64 * desc.uniforms.len());
    src.push_str(PRELUDE);
    src.push('\n');
    for (slot, name) in desc.uniforms.iter().enumerate() {
        let _ = writeln!(src, "fn u_{name}() -> vec4<f32> {{\n    return kiln_draw.slots[{slot}];\n}}");
    }
    src.push('\n');
    src.push_str(&desc.fragment);
    src
}
