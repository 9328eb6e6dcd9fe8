use std::collections::HashSet;

use super::types::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta,
    PointerButtonEvent, PointerMoveEvent, LINE_SCROLL_PIXELS,
};

/// Polled keyboard/mouse state for one window.
///
/// Held state persists across frames. Hit/up edges and wheel deltas are
/// visible until the next [`update`](Self::update), which the engine calls
/// once per tick after the scene's update.
#[derive(Debug, Default)]
pub struct Input {
    modifiers: Modifiers,
    focused: bool,

    keys_down: HashSet<Key>,
    keys_hit: HashSet<Key>,
    keys_up: HashSet<Key>,

    buttons_down: HashSet<MouseButton>,
    buttons_hit: HashSet<MouseButton>,
    buttons_up: HashSet<MouseButton>,

    /// Pointer position; the window runtime reports virtual screen pixels.
    mouse: (f32, f32),
    wheel: (f32, f32),
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one platform event.
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = m;
            }

            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // No release events arrive while unfocused.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.mouse = (x, y);
            }

            // Last known position is kept.
            InputEvent::PointerLeft => {}

            InputEvent::Key {
                key,
                state,
                modifiers,
                ..
            } => {
                self.modifiers = modifiers;
                match state {
                    KeyState::Pressed => {
                        if self.keys_down.insert(key) {
                            self.keys_hit.insert(key);
                        }
                    }
                    KeyState::Released => {
                        self.keys_down.remove(&key);
                        self.keys_up.insert(key);
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.mouse = (x, y);
                self.modifiers = modifiers;
                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(button) {
                            self.buttons_hit.insert(button);
                        }
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(&button);
                        self.buttons_up.insert(button);
                    }
                }
            }

            InputEvent::MouseWheel { delta, modifiers } => {
                self.modifiers = modifiers;
                self.wheel = match delta {
                    MouseWheelDelta::Line { x, y } => (x * LINE_SCROLL_PIXELS, y * LINE_SCROLL_PIXELS),
                    MouseWheelDelta::Pixel { x, y } => (x, y),
                };
            }
        }
    }

    /// Ends the input frame: clears hit/up edges and wheel deltas.
    pub fn update(&mut self) {
        self.keys_hit.clear();
        self.keys_up.clear();
        self.buttons_hit.clear();
        self.buttons_up.clear();
        self.wheel = (0.0, 0.0);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// True for the frame in which `key` went down.
    pub fn key_hit(&self, key: Key) -> bool {
        self.keys_hit.contains(&key)
    }

    pub fn key_up(&self, key: Key) -> bool {
        self.keys_up.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn mouse_hit(&self, button: MouseButton) -> bool {
        self.buttons_hit.contains(&button)
    }

    pub fn mouse_up(&self, button: MouseButton) -> bool {
        self.buttons_up.contains(&button)
    }

    pub fn mouse_x(&self) -> f32 {
        self.mouse.0
    }

    pub fn mouse_y(&self) -> f32 {
        self.mouse.1
    }

    pub fn mouse_wheel_x(&self) -> f32 {
        self.wheel.0
    }

    pub fn mouse_wheel_y(&self) -> f32 {
        self.wheel.1
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn focused(&self) -> bool {
        self.focused
    }
}
