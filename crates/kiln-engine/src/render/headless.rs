//! Backend that performs no GPU work and records every call.
//!
//! Used by tests and by tools that need the renderer's batching behaviour
//! without a device.

use std::cell::RefCell;
use std::rc::Rc;

use crate::paint::Color;

use super::backend::{DrawCall, RenderBackend, ShaderDesc, ShaderId, TextureId};
use super::{BlendMode, RenderError, Vertex};

/// Owned copy of a [`DrawCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub vertices: Vec<Vertex>,
    pub blend: BlendMode,
    pub texture: Option<TextureId>,
    pub shader: Option<ShaderId>,
    pub uniforms: Vec<[f32; 4]>,
    pub aux_texture: Option<TextureId>,
    pub target: Option<TextureId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateTexture { id: TextureId, width: u32, height: u32 },
    UpdateTexture { id: TextureId, width: u32, height: u32 },
    CreateRenderTarget { id: TextureId, width: u32, height: u32 },
    DestroyTexture(TextureId),
    CreateShader { id: ShaderId, label: String },
    BeginFrame(Color),
    Clear { target: Option<TextureId>, color: Color },
    Draw(RecordedDraw),
    EndFrame,
}

/// Shared view of everything a [`HeadlessBackend`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<BackendCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.0.borrow().clone()
    }

    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                BackendCall::Draw(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, call: BackendCall) {
        self.0.borrow_mut().push(call);
    }
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    log: CallLog,
    next_texture: u32,
    next_shader: u32,
    /// GPU time reported by the next `poll_gpu_time_ms`.
    pending_gpu_time: Option<f32>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the backend and a handle to its call log.
    pub fn with_log() -> (Self, CallLog) {
        let backend = Self::default();
        let log = backend.log.clone();
        (backend, log)
    }

    /// Makes the next `poll_gpu_time_ms` return `ms`.
    pub fn report_gpu_time(&mut self, ms: f32) {
        self.pending_gpu_time = Some(ms);
    }

    fn alloc_texture(&mut self) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        id
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_texture(&mut self, width: u32, height: u32, _rgba: &[u8]) -> TextureId {
        let id = self.alloc_texture();
        self.log.push(BackendCall::CreateTexture { id, width, height });
        id
    }

    fn update_texture(&mut self, id: TextureId, width: u32, height: u32, _rgba: &[u8]) {
        self.log.push(BackendCall::UpdateTexture { id, width, height });
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> TextureId {
        let id = self.alloc_texture();
        self.log.push(BackendCall::CreateRenderTarget { id, width, height });
        id
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.log.push(BackendCall::DestroyTexture(id));
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<ShaderId, RenderError> {
        desc.validate()?;
        let id = ShaderId(self.next_shader);
        self.next_shader += 1;
        self.log.push(BackendCall::CreateShader { id, label: desc.label.clone() });
        Ok(id)
    }

    fn begin_frame(&mut self, clear: Color) {
        self.log.push(BackendCall::BeginFrame(clear));
    }

    fn clear(&mut self, target: Option<TextureId>, color: Color) {
        self.log.push(BackendCall::Clear { target, color });
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        self.log.push(BackendCall::Draw(RecordedDraw {
            vertices: call.vertices.to_vec(),
            blend: call.blend,
            texture: call.texture,
            shader: call.shader,
            uniforms: call.uniforms.to_vec(),
            aux_texture: call.aux_texture,
            target: call.target,
        }));
    }

    fn end_frame(&mut self) {
        self.log.push(BackendCall::EndFrame);
    }

    fn poll_gpu_time_ms(&mut self) -> Option<f32> {
        self.pending_gpu_time.take()
    }
}
