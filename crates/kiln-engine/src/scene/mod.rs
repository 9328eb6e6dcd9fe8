//! Scene loop and systems.

mod engine;
mod lifecycle;
mod system;

pub use engine::{Engine, EngineConfig, EngineError};
pub use lifecycle::{InitCtx, Scene, UpdateCtx};
pub use system::{Stage, System, SystemManager};
