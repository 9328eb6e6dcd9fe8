//! Application contract between the window runtime and a game.

mod app;

pub use app::{App, AppControl};
