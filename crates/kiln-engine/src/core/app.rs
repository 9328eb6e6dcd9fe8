use crate::scene::Engine;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by games.
pub trait App {
    /// Called once after the window and engine exist. Typically adds systems
    /// and sets the first scene.
    fn setup(&mut self, engine: &mut Engine) -> anyhow::Result<()>;

    /// Called before every engine tick, with this tick's input already
    /// applied. Global hotkeys go here.
    fn on_frame(&mut self, engine: &mut Engine) -> AppControl {
        let _ = engine;
        AppControl::Continue
    }
}
