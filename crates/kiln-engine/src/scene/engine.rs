use std::time::{Duration, Instant};

use thiserror::Error;

use crate::audio::Audio;
use crate::input::Input;
use crate::render::Renderer;
use crate::time::{FrameClock, FrameTime};

use super::lifecycle::{InitCtx, Scene, UpdateCtx};
use super::system::{Stage, System, SystemManager};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no active scene")]
    NoActiveScene,

    #[error("scene '{scene}' failed to initialize")]
    SceneInit {
        scene: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lower clamp of the frame delta.
    pub dt_min: Duration,
    /// Upper clamp of the frame delta.
    pub dt_max: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dt_min: FrameClock::DEFAULT_DT_MIN,
            dt_max: FrameClock::DEFAULT_DT_MAX,
        }
    }
}

struct ActiveScene {
    scene: Box<dyn Scene>,
    /// Set once `poll_ready` reported the scene's init work as done.
    loaded: bool,
}

/// Scene loop: owns the renderer, input, audio state and systems, and
/// drives the active scene once per [`frame`](Self::frame).
pub struct Engine {
    renderer: Renderer,
    input: Input,
    audio: Audio,
    systems: SystemManager,
    clock: FrameClock,
    active: Option<ActiveScene>,
    next_scene: Option<Box<dyn Scene>>,
}

impl Engine {
    pub fn new(renderer: Renderer, config: EngineConfig) -> Self {
        Self {
            renderer,
            input: Input::new(),
            audio: Audio::new(),
            systems: SystemManager::new(),
            clock: FrameClock::with_clamps(config.dt_min, config.dt_max),
            active: None,
            next_scene: None,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Runtime side of input: platform events are applied here.
    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut Audio {
        &mut self.audio
    }

    pub fn add_system(&mut self, system: Box<dyn System>, stage: Stage) {
        self.systems.add(system, stage);
    }

    pub fn has_scene(&self) -> bool {
        self.active.is_some()
    }

    /// Name of the active scene.
    pub fn scene_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.scene.name())
    }

    /// Whether the active scene finished loading.
    pub fn scene_loaded(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.loaded)
    }

    pub fn can_pause(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.scene.can_pause())
    }

    /// Makes `next` the active scene.
    ///
    /// The outgoing scene gets `on_exit(next)` first, then `next.init` runs.
    /// The new scene is updated and rendered only once its
    /// [`poll_ready`](Scene::poll_ready) returns `true`. When `init` fails
    /// there is no active scene afterwards.
    pub fn change_scene(&mut self, mut next: Box<dyn Scene>) -> Result<(), EngineError> {
        if let Some(mut old) = self.active.take() {
            log::info!("scene change: {} -> {}", old.scene.name(), next.name());
            old.scene.on_exit(next.as_ref());
        } else {
            log::info!("scene: {}", next.name());
        }

        let mut ctx = InitCtx {
            renderer: &mut self.renderer,
            audio: &mut self.audio,
        };
        next.init(&mut ctx).map_err(|source| EngineError::SceneInit {
            scene: next.name().to_owned(),
            source,
        })?;

        self.active = Some(ActiveScene {
            scene: next,
            loaded: false,
        });
        Ok(())
    }

    pub fn frame(&mut self) -> Result<FrameTime, EngineError> {
        self.frame_at(Instant::now())
    }

    /// Runs one tick at time `now`.
    ///
    /// Order: pump texture loads, poll pending init, early systems, scene
    /// update, late systems, audio, input edge reset, queued scene change,
    /// then the render pass (scene, systems).
    pub fn frame_at(&mut self, now: Instant) -> Result<FrameTime, EngineError> {
        if self.active.is_none() {
            return Err(EngineError::NoActiveScene);
        }

        let time = self.clock.tick_at(now);
        let dt = time.dt;

        let loaded = self.renderer.pump_texture_loads();
        if loaded > 0 {
            log::trace!("{loaded} texture load(s) applied");
        }

        self.poll_scene_ready()?;

        // ── update ──
        self.systems.update(dt);
        if let Some(active) = self.active.as_mut().filter(|a| a.loaded) {
            let mut ctx = UpdateCtx {
                dt,
                input: &self.input,
                audio: &mut self.audio,
                next_scene: &mut self.next_scene,
            };
            active.scene.update(&mut ctx);
        }
        self.systems.late_update(dt);
        self.audio.update(dt);
        self.input.update();

        if let Some(next) = self.next_scene.take() {
            self.change_scene(next)?;
        }

        // ── render ──
        let Some(active) = self.active.as_mut() else {
            return Err(EngineError::NoActiveScene);
        };
        self.renderer.begin_frame(active.scene.clear_color());
        if active.loaded {
            active.scene.render(&mut self.renderer);
        }
        self.systems.render(&mut self.renderer);
        self.renderer.end_frame();

        Ok(time)
    }

    fn poll_scene_ready(&mut self) -> Result<(), EngineError> {
        let Some(active) = self.active.as_mut().filter(|a| !a.loaded) else {
            return Ok(());
        };
        match active.scene.poll_ready(&self.renderer) {
            Ok(true) => {
                log::info!("scene ready: {}", active.scene.name());
                active.loaded = true;
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(source) => {
                let scene = active.scene.name().to_owned();
                self.active = None;
                Err(EngineError::SceneInit { scene, source })
            }
        }
    }
}
