use kiln_engine::core::{App, AppControl};
use kiln_engine::input::Key;
use kiln_engine::scene::{Engine, Scene, Stage};
use kiln_engine::systems::DebugStats;

use crate::scenes::{ShapesScene, TilemapScene};

/// Demo game: `1` and `2` switch scenes, Escape quits.
#[derive(Default)]
pub struct Demo;

impl Demo {
    fn switch(engine: &mut Engine, scene: Box<dyn Scene>) {
        if let Err(err) = engine.change_scene(scene) {
            log::error!("{err:#}");
        }
    }
}

impl App for Demo {
    fn setup(&mut self, engine: &mut Engine) -> anyhow::Result<()> {
        engine.add_system(Box::new(DebugStats::default()), Stage::Late);
        engine.change_scene(Box::new(TilemapScene::default()))?;
        Ok(())
    }

    fn on_frame(&mut self, engine: &mut Engine) -> AppControl {
        let input = engine.input();
        if input.key_hit(Key::Escape) {
            return AppControl::Exit;
        }

        if input.key_hit(Key::Digit1) {
            Self::switch(engine, Box::new(TilemapScene::default()));
        } else if input.key_hit(Key::Digit2) {
            Self::switch(engine, Box::new(ShapesScene::default()));
        }

        // No output device here; the queue is only traced.
        for cmd in engine.audio_mut().drain_commands() {
            log::trace!("audio: {cmd:?}");
        }

        AppControl::Continue
    }
}
