use crate::render::Renderer;

/// Engine-wide logic running alongside the active scene.
pub trait System {
    fn update(&mut self, dt: f32);

    fn render(&mut self, r: &mut Renderer) {
        let _ = r;
    }
}

/// When a system's `update` runs relative to the scene's.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Stage {
    /// Before the scene.
    Early,
    /// After the scene.
    #[default]
    Late,
}

/// Early and late systems, each kept in insertion order.
#[derive(Default)]
pub struct SystemManager {
    early: Vec<Box<dyn System>>,
    late: Vec<Box<dyn System>>,
}

impl SystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, system: Box<dyn System>, stage: Stage) {
        match stage {
            Stage::Early => self.early.push(system),
            Stage::Late => self.late.push(system),
        }
    }

    pub fn len(&self) -> usize {
        self.early.len() + self.late.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Updates early systems.
    pub fn update(&mut self, dt: f32) {
        for s in &mut self.early {
            s.update(dt);
        }
    }

    /// Updates late systems.
    pub fn late_update(&mut self, dt: f32) {
        for s in &mut self.late {
            s.update(dt);
        }
    }

    /// Renders early systems, then late ones.
    pub fn render(&mut self, r: &mut Renderer) {
        for s in self.early.iter_mut().chain(self.late.iter_mut()) {
            s.render(r);
        }
    }
}
