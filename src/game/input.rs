//! Input snapshot handed to the simulation each frame
//!
//! The capture layer owns devices; it reports which keys and buttons are
//! held, and this type derives "just pressed" edges by comparing against
//! the previous frame.

use smallvec::SmallVec;

use crate::util::vec2::Vec2;

/// Logical keys the simulation reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Cycles the player color
    Cycle,
}

/// Pointer buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held_keys: SmallVec<[Key; 8]>,
    pressed_keys: SmallVec<[Key; 4]>,
    held_buttons: SmallVec<[Button; 2]>,
    pressed_buttons: SmallVec<[Button; 2]>,
    pointer: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the devices' state for a new frame and derive edges
    pub fn update(&mut self, keys: &[Key], buttons: &[Button], pointer: Vec2) {
        self.pressed_keys = keys
            .iter()
            .copied()
            .filter(|k| !self.held_keys.contains(k))
            .collect();
        self.pressed_buttons = buttons
            .iter()
            .copied()
            .filter(|b| !self.held_buttons.contains(b))
            .collect();
        self.held_keys = keys.iter().copied().collect();
        self.held_buttons = buttons.iter().copied().collect();
        self.pointer = pointer;
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.held_keys.contains(&key)
    }

    pub fn is_key_just_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_button_pressed(&self, button: Button) -> bool {
        self.held_buttons.contains(&button)
    }

    pub fn is_button_just_pressed(&self, button: Button) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_any_just_pressed(&self) -> bool {
        !self.pressed_keys.is_empty() || !self.pressed_buttons.is_empty()
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Raw (unnormalized) direction from the held directional keys
    pub fn move_intent(&self) -> Vec2 {
        let mut intent = Vec2::ZERO;
        if self.is_key_pressed(Key::Up) {
            intent += Vec2::UP;
        }
        if self.is_key_pressed(Key::Down) {
            intent += Vec2::DOWN;
        }
        if self.is_key_pressed(Key::Left) {
            intent += Vec2::LEFT;
        }
        if self.is_key_pressed(Key::Right) {
            intent += Vec2::RIGHT;
        }
        intent
    }

    /// Carry over edges from an earlier snapshot that no step consumed
    pub fn with_edges_from(&self, earlier: &InputState) -> Self {
        let mut merged = self.clone();
        for key in &earlier.pressed_keys {
            if !merged.pressed_keys.contains(key) {
                merged.pressed_keys.push(*key);
            }
        }
        for button in &earlier.pressed_buttons {
            if !merged.pressed_buttons.contains(button) {
                merged.pressed_buttons.push(*button);
            }
        }
        merged
    }

    /// Same held state, edges cleared; used for fixed substeps after the first
    pub fn without_edges(&self) -> Self {
        Self {
            held_keys: self.held_keys.clone(),
            pressed_keys: SmallVec::new(),
            held_buttons: self.held_buttons.clone(),
            pressed_buttons: SmallVec::new(),
            pointer: self.pointer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_only_on_first_frame() {
        let mut input = InputState::new();
        input.update(&[Key::Cycle], &[Button::Primary], Vec2::ZERO);
        assert!(input.is_key_just_pressed(Key::Cycle));
        assert!(input.is_button_just_pressed(Button::Primary));

        input.update(&[Key::Cycle], &[Button::Primary], Vec2::ZERO);
        assert!(input.is_key_pressed(Key::Cycle));
        assert!(!input.is_key_just_pressed(Key::Cycle));
        assert!(!input.is_button_just_pressed(Button::Primary));

        input.update(&[], &[], Vec2::ZERO);
        input.update(&[Key::Cycle], &[], Vec2::ZERO);
        assert!(input.is_key_just_pressed(Key::Cycle));
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut input = InputState::new();
        input.update(&[Key::Left, Key::Right, Key::Up], &[], Vec2::ZERO);
        assert_eq!(input.move_intent(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_without_edges_keeps_held() {
        let mut input = InputState::new();
        input.update(&[Key::Down], &[Button::Primary], Vec2::new(4.0, 2.0));
        let stripped = input.without_edges();
        assert!(stripped.is_key_pressed(Key::Down));
        assert!(!stripped.is_any_just_pressed());
        assert_eq!(stripped.pointer(), Vec2::new(4.0, 2.0));
    }

    #[test]
    fn test_unconsumed_edges_carry_over() {
        let mut earlier = InputState::new();
        earlier.update(&[Key::Cycle], &[], Vec2::ZERO);
        let mut now = earlier.clone();
        now.update(&[], &[Button::Primary], Vec2::new(1.0, 1.0));

        let merged = now.with_edges_from(&earlier);
        assert!(merged.is_key_just_pressed(Key::Cycle));
        assert!(merged.is_button_just_pressed(Button::Primary));
        assert!(!merged.is_key_pressed(Key::Cycle));
        assert_eq!(merged.pointer(), Vec2::new(1.0, 1.0));
    }
}
