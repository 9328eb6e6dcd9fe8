use crate::audio::Audio;
use crate::input::Input;
use crate::paint::Color;
use crate::render::Renderer;

/// Context handed to [`Scene::init`].
pub struct InitCtx<'a> {
    pub renderer: &'a mut Renderer,
    pub audio: &'a mut Audio,
}

/// Context handed to [`Scene::update`].
pub struct UpdateCtx<'a> {
    /// Clamped frame delta in seconds.
    pub dt: f32,
    pub input: &'a Input,
    pub audio: &'a mut Audio,
    pub(crate) next_scene: &'a mut Option<Box<dyn Scene>>,
}

impl UpdateCtx<'_> {
    /// Requests a scene change. Applied after this tick's update phase; a
    /// later request in the same tick replaces an earlier one.
    pub fn change_scene(&mut self, scene: Box<dyn Scene>) {
        *self.next_scene = Some(scene);
    }

    pub fn scene_change_pending(&self) -> bool {
        self.next_scene.is_some()
    }
}

/// A game state driven by the engine loop.
///
/// `init` runs once when the scene becomes active and may start background
/// work (texture loads). The engine polls [`poll_ready`](Self::poll_ready)
/// every tick and only calls `update`/`render` after it returned `true`.
pub trait Scene {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn init(&mut self, ctx: &mut InitCtx<'_>) -> anyhow::Result<()>;

    /// Whether the work started by `init` has finished.
    fn poll_ready(&mut self, renderer: &Renderer) -> anyhow::Result<bool> {
        let _ = renderer;
        Ok(true)
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>);

    fn render(&mut self, r: &mut Renderer);

    /// Called once on the outgoing scene, before `next` is initialized.
    fn on_exit(&mut self, next: &dyn Scene) {
        let _ = next;
    }

    fn can_pause(&self) -> bool {
        false
    }

    fn clear_color(&self) -> Color {
        Color::BLACK
    }
}
