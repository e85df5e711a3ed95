use std::collections::HashSet;

use crate::coords::Vec2;

use super::types::{ButtonState, InputEvent, Key, MouseButton};

/// Keyboard and mouse snapshot for one frame.
///
/// Events are applied as they arrive; [`Input::end_frame`] copies the current
/// sets into the previous ones so `pressed`/`released` compare consecutive
/// frames.
#[derive(Debug, Default, Clone)]
pub struct Input {
    keys: HashSet<Key>,
    previous_keys: HashSet<Key>,
    buttons: HashSet<MouseButton>,
    previous_buttons: HashSet<MouseButton>,
    pointer: Option<Vec2>,
    wheel: Vec2,
    focused: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, state, .. } => match state {
                ButtonState::Pressed => {
                    self.keys.insert(key);
                }
                ButtonState::Released => {
                    self.keys.remove(&key);
                }
            },
            InputEvent::PointerMoved(at) => self.pointer = Some(at),
            InputEvent::PointerButton { button, state } => match state {
                ButtonState::Pressed => {
                    self.buttons.insert(button);
                }
                ButtonState::Released => {
                    self.buttons.remove(&button);
                }
            },
            InputEvent::Wheel(delta) => self.wheel += delta,
            InputEvent::PointerLeft => self.pointer = None,
            InputEvent::Focused(focused) => {
                self.focused = focused;
                // Releases never arrive for keys held while focus moves away.
                if !focused {
                    self.keys.clear();
                    self.buttons.clear();
                }
            }
        }
    }

    /// Rolls the current state into the previous-frame state.
    pub fn end_frame(&mut self) {
        self.previous_keys.clone_from(&self.keys);
        self.previous_buttons.clone_from(&self.buttons);
        self.wheel = Vec2::zero();
    }

    // ── keyboard ──────────────────────────────────────────────────────────

    #[inline]
    pub fn down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    #[inline]
    pub fn pressed(&self, key: Key) -> bool {
        self.keys.contains(&key) && !self.previous_keys.contains(&key)
    }

    #[inline]
    pub fn released(&self, key: Key) -> bool {
        !self.keys.contains(&key) && self.previous_keys.contains(&key)
    }

    /// -1, 0 or 1 from a pair of opposing keys.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        match (self.down(negative), self.down(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    // ── mouse ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    #[inline]
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button) && !self.previous_buttons.contains(&button)
    }

    #[inline]
    pub fn mouse_released(&self, button: MouseButton) -> bool {
        !self.buttons.contains(&button) && self.previous_buttons.contains(&button)
    }

    /// Pointer in window pixels, `None` while outside the window.
    #[inline]
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Scroll accumulated this frame.
    #[inline]
    pub fn wheel(&self) -> Vec2 {
        self.wheel
    }

    #[inline]
    pub fn is_focused(&self) -> bool {
        self.focused
    }
}
