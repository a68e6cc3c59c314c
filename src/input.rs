use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

/// Friendly names for the non-character keys the renderer binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Escape,
    Left,
    Right,
    Up,
    Down,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Snapshot of the pointer and key state sampled by the frame loop.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    mouse_buttons: RwLock<HashSet<MouseButton>>,
    mouse_position: RwLock<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn set_mouse_button_down(&self, button: MouseButton) {
        self.mouse_buttons.write().insert(button);
    }

    pub fn set_mouse_button_up(&self, button: MouseButton) {
        self.mouse_buttons.write().remove(&button);
    }

    /// Records the new cursor position and returns the delta from the
    /// previous one.
    pub fn update_mouse_position(&self, position: Vec2) -> Vec2 {
        let mut guard = self.mouse_position.write();
        let delta = position - *guard;
        *guard = position;
        delta
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.read().contains(&button)
    }

    pub fn mouse_position(&self) -> Vec2 {
        *self.mouse_position.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_state_tracks_keys() {
        let state = InputState::new();
        state.set_key_down(KeyCode::Character('S'));
        assert!(state.is_key_down(KeyCode::Character('S')));
        state.set_key_up(KeyCode::Character('S'));
        assert!(!state.is_key_down(KeyCode::Character('S')));
    }

    #[test]
    fn input_state_tracks_buttons() {
        let state = InputState::new();
        state.set_mouse_button_down(MouseButton::LEFT);
        assert!(state.is_mouse_button_down(MouseButton::LEFT));
        state.set_mouse_button_up(MouseButton::LEFT);
        assert!(!state.is_mouse_button_down(MouseButton::LEFT));
    }

    #[test]
    fn mouse_position_updates_report_deltas() {
        let state = InputState::new();
        state.update_mouse_position(Vec2::new(10.0, 10.0));
        let delta = state.update_mouse_position(Vec2::new(13.0, 6.0));
        assert_eq!(delta, Vec2::new(3.0, -4.0));
        assert_eq!(state.mouse_position(), Vec2::new(13.0, 6.0));
    }
}
