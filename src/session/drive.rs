//! Drive mode steering controls
//!
//! In drive mode the movement stick is replaced by discrete steer buttons
//! that write fixed heading values.

use serde::{Deserialize, Serialize};

/// A steer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SteerControl {
    Left,
    Right,
    SoftLeft,
    SoftRight,
    QuickTurn,
}

impl SteerControl {
    /// Heading written to `ls.x` while held
    pub fn axis_value(&self) -> f32 {
        match self {
            SteerControl::Left => -1.0,
            SteerControl::Right => 1.0,
            SteerControl::SoftLeft => -0.7,
            SteerControl::SoftRight => 0.7,
            SteerControl::QuickTurn => -1.0,
        }
    }
}

/// Vibration patterns, milliseconds on/off
pub mod haptics {
    pub const BUTTON_PRESS: &[u32] = &[10];
    pub const STEER_PRESS: &[u32] = &[15];
    pub const DRIVE_MODE_ON: &[u32] = &[50, 50, 50];
    pub const DRIVE_MODE_OFF: &[u32] = &[30];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_values() {
        assert_eq!(SteerControl::Left.axis_value(), -1.0);
        assert_eq!(SteerControl::Right.axis_value(), 1.0);
        assert_eq!(SteerControl::SoftLeft.axis_value(), -0.7);
        assert_eq!(SteerControl::QuickTurn.axis_value(), -1.0);
    }

    #[test]
    fn test_wire_names() {
        let parsed: SteerControl = serde_json::from_str("\"soft-left\"").unwrap();
        assert_eq!(parsed, SteerControl::SoftLeft);
    }
}
