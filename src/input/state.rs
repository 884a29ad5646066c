//! Canonical controller snapshot.
//!
//! `InputState` is a passive record: two sticks and a button map. It is
//! mutated in place by the controller session and re-sent whole after every
//! change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::stick::{StickId, StickVector};

/// Button identifier as carried on the wire (e.g. "a", "jump", "reload")
pub type ButtonId = String;

/// Full controller state, serialized as `{ls:{x,y}, rs:{x,y}, buttons:{id:bool}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    #[serde(rename = "ls", default)]
    pub left_stick: StickVector,
    #[serde(rename = "rs", default)]
    pub right_stick: StickVector,
    /// Keys appear once a button has been pressed in this session.
    #[serde(default)]
    pub buttons: BTreeMap<ButtonId, bool>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stick(&self, stick: StickId) -> StickVector {
        match stick {
            StickId::Left => self.left_stick,
            StickId::Right => self.right_stick,
        }
    }

    /// Replace a whole axis pair. The vector is re-clamped on the way in.
    pub fn set_stick(&mut self, stick: StickId, value: StickVector) {
        let value = StickVector::new(value.x, value.y);
        match stick {
            StickId::Left => self.left_stick = value,
            StickId::Right => self.right_stick = value,
        }
    }

    pub fn reset_stick(&mut self, stick: StickId) {
        self.set_stick(stick, StickVector::ZERO);
    }

    /// Keys appear on first press; releasing an unknown id adds nothing.
    pub fn set_button(&mut self, id: &str, pressed: bool) {
        if pressed {
            self.buttons.insert(id.to_string(), true);
        } else if let Some(state) = self.buttons.get_mut(id) {
            *state = false;
        }
    }

    /// Absent and explicit `false` both read as released.
    pub fn is_pressed(&self, id: &str) -> bool {
        self.buttons.get(id).copied().unwrap_or(false)
    }

    /// Ids currently held down
    pub fn pressed_buttons(&self) -> impl Iterator<Item = &str> {
        self.buttons
            .iter()
            .filter(|(_, pressed)| **pressed)
            .map(|(id, _)| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_state_is_centered() {
        let state = InputState::new();
        assert!(state.left_stick.is_zero());
        assert!(state.right_stick.is_zero());
        assert!(state.buttons.is_empty());
    }

    #[test]
    fn test_wire_shape() {
        let mut state = InputState::new();
        state.set_stick(StickId::Left, StickVector::new(0.5, 0.0));
        state.set_button("a", true);

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({"ls": {"x": 0.5, "y": 0.0}, "rs": {"x": 0.0, "y": 0.0}, "buttons": {"a": true}})
        );
    }

    #[test]
    fn test_set_stick_clamps_magnitude() {
        let mut state = InputState::new();
        state.set_stick(StickId::Right, StickVector { x: 3.0, y: 4.0 });
        let rs = state.stick(StickId::Right);
        assert!((rs.magnitude() - 1.0).abs() < 1e-6);
        assert!((rs.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_button_toggle_leaves_others_untouched() {
        let mut state = InputState::new();
        state.set_button("a", true);
        state.set_button("b", true);
        state.set_button("a", false);

        assert!(!state.is_pressed("a"));
        assert!(state.is_pressed("b"));
        assert!(!state.is_pressed("never-pressed"));
        assert_eq!(state.buttons.len(), 2);
        assert_eq!(state.pressed_buttons().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_release_of_unknown_button_adds_no_key() {
        let mut state = InputState::new();
        state.set_button("x", false);
        assert!(state.buttons.is_empty());

        state.set_button("x", true);
        state.set_button("x", false);
        assert_eq!(state.buttons.get("x"), Some(&false));
    }

    #[test]
    fn test_missing_fields_decode_as_released() {
        let state: InputState = serde_json::from_value(json!({"ls": {"x": 0.25, "y": 0.0}})).unwrap();
        assert_eq!(state.left_stick.x, 0.25);
        assert!(state.right_stick.is_zero());
        assert!(state.buttons.is_empty());
    }
}
