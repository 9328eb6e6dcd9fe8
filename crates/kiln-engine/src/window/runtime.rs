use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::core::{App, AppControl};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::input::platform::translate_window_event;
use crate::input::{InputEvent, PointerMoveEvent};
use crate::render::{Renderer, RendererConfig, SurfaceSlot, WgpuBackend};
use crate::scene::{Engine, EngineConfig};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub renderer: RendererConfig,
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let renderer = RendererConfig::default();
        Self {
            title: "kiln".to_string(),
            initial_size: LogicalSize::new(renderer.width as f64 * 3.0, renderer.height as f64 * 3.0),
            renderer,
            engine: EngineConfig::default(),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, builds the engine on top of it and runs `app`
    /// until the window closes or the app asks to exit.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    engine: Option<Engine>,
    surface: SurfaceSlot,

    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            engine: None,
            surface: SurfaceSlot::default(),
            exit_requested: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let renderer_config = self.config.renderer.clone();
        let backend = entry.with_gpu(|gpu| {
            WgpuBackend::new(
                gpu.device().clone(),
                gpu.queue().clone(),
                gpu.surface_format(),
                (renderer_config.width, renderer_config.height),
            )
        });
        self.surface = backend.surface_slot();

        let renderer = Renderer::new(Box::new(backend), renderer_config);
        let mut engine = Engine::new(renderer, self.config.engine.clone());
        self.app.setup(&mut engine).context("app setup failed")?;

        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);
        self.engine = Some(engine);
        Ok(())
    }

    /// Runs one engine tick into the next swapchain image.
    fn redraw(&mut self) -> Result<AppControl> {
        let (Some(entry), Some(engine)) = (self.window.as_mut(), self.engine.as_mut()) else {
            return Ok(AppControl::Continue);
        };

        if self.app.on_frame(engine) == AppControl::Exit {
            return Ok(AppControl::Exit);
        }

        let frame = entry.with_gpu_mut(|gpu| match gpu.acquire_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => match gpu.handle_surface_error(err.clone()) {
                SurfaceErrorAction::Fatal => Err(anyhow::anyhow!("surface error: {err}")),
                action => {
                    log::debug!("surface error {err}: {action:?}");
                    Ok(None)
                }
            },
        })?;

        let size = entry.borrow_gpu().size();
        if let Some(frame) = &frame {
            self.surface.attach(frame.view.clone(), size.width, size.height);
        }

        let result = engine.frame();
        self.surface.detach();
        if let Some(frame) = frame {
            entry.borrow_gpu().present(frame);
        }
        result.context("frame failed")?;

        Ok(AppControl::Continue)
    }

    fn handle_input(&mut self, event: &WindowEvent) {
        let (Some(entry), Some(engine)) = (self.window.as_ref(), self.engine.as_mut()) else {
            return;
        };
        let window = entry.borrow_window();
        let Some(ev) = translate_window_event(window, engine.input(), event) else {
            return;
        };

        let size = entry.borrow_gpu().size();
        let view = Viewport::letterbox(engine.renderer().resolution(), (size.width, size.height));
        let ev = pointer_to_virtual(ev, &view, window.scale_factor() as f32);
        engine.input_mut().apply_event(ev);
    }
}

/// Maps pointer positions from logical window pixels to virtual screen
/// pixels. Other events pass through.
fn pointer_to_virtual(ev: InputEvent, view: &Viewport, scale_factor: f32) -> InputEvent {
    match ev {
        InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
            let (x, y) = view.to_virtual(x * scale_factor, y * scale_factor);
            InputEvent::PointerMoved(PointerMoveEvent { x, y })
        }
        other => other,
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        self.handle_input(&event);

        match &event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                }
            }

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(AppControl::Continue) => {}
                Ok(AppControl::Exit) => {
                    self.exit_requested = true;
                    event_loop.exit();
                }
                Err(err) => self.fail(event_loop, err),
            },

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_maps_through_letterbox_and_dpi() {
        // 340x220 virtual in a 1360x1000 surface: scale 4, bars top and bottom
        let view = Viewport::letterbox((340, 220), (1360, 1000));
        let ev = InputEvent::PointerMoved(PointerMoveEvent { x: 340.0, y: 50.0 });
        let InputEvent::PointerMoved(p) = pointer_to_virtual(ev, &view, 2.0) else {
            panic!("pointer event expected");
        };
        assert_eq!((p.x, p.y), (170.0, 10.0));
    }

    #[test]
    fn other_events_pass_through() {
        let view = Viewport::letterbox((340, 220), (680, 440));
        assert_eq!(pointer_to_virtual(InputEvent::Focused(true), &view, 1.0), InputEvent::Focused(true));
    }
}
