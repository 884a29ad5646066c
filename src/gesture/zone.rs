//! Zone configuration and per-zone touch ownership.

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::input::stick::{
    StickId, DEFAULT_BASE_DRAG, DEFAULT_INPUT_RADIUS, DEFAULT_SENSITIVITY_SCALE,
    DEFAULT_VISUAL_RADIUS,
};

/// Zone identifier (e.g. "left-stick", "right-zone")
pub type ZoneId = String;

/// Platform-assigned touch identifier
pub type ContactId = i64;

pub const LEFT_STICK_ZONE: &str = "left-stick";
pub const RIGHT_ZONE: &str = "right-zone";

/// Where displacement is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginMode {
    /// Center of the zone's current bounding rectangle
    Fixed,
    /// The touch-down point; the knob is drawn under the finger
    Floating,
}

/// How displacement becomes a stick vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StickResponse {
    /// Circular saturation at `input_radius`
    Polar {
        #[serde(default = "default_input_radius")]
        input_radius: f32,
        #[serde(default = "default_visual_radius")]
        visual_radius: f32,
    },
    /// Per-axis clamp against a drag span derived from sensitivity
    Linear {
        #[serde(default = "default_base_drag")]
        base_drag: f32,
        #[serde(default = "default_sensitivity_scale")]
        sensitivity_scale: f32,
        #[serde(default = "default_visual_radius")]
        visual_radius: f32,
    },
}

impl StickResponse {
    pub fn visual_radius(&self) -> f32 {
        match self {
            StickResponse::Polar { visual_radius, .. } => *visual_radius,
            StickResponse::Linear { visual_radius, .. } => *visual_radius,
        }
    }
}

impl Default for StickResponse {
    fn default() -> Self {
        StickResponse::Polar {
            input_radius: DEFAULT_INPUT_RADIUS,
            visual_radius: DEFAULT_VISUAL_RADIUS,
        }
    }
}

/// Static configuration of one analog zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: ZoneId,
    pub stick: StickId,
    pub origin: OriginMode,
    #[serde(default)]
    pub response: StickResponse,
}

impl ZoneConfig {
    /// Fixed-origin polar movement stick
    pub fn left_stick() -> Self {
        Self {
            id: LEFT_STICK_ZONE.to_string(),
            stick: StickId::Left,
            origin: OriginMode::Fixed,
            response: StickResponse::default(),
        }
    }

    /// Floating-origin linear aim zone
    pub fn aim_zone() -> Self {
        Self {
            id: RIGHT_ZONE.to_string(),
            stick: StickId::Right,
            origin: OriginMode::Floating,
            response: StickResponse::Linear {
                base_drag: DEFAULT_BASE_DRAG,
                sensitivity_scale: DEFAULT_SENSITIVITY_SCALE,
                visual_radius: DEFAULT_VISUAL_RADIUS,
            },
        }
    }

    /// The stock two-zone layout
    pub fn default_zones() -> Vec<ZoneConfig> {
        vec![Self::left_stick(), Self::aim_zone()]
    }
}

/// The contact a zone currently owns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSession {
    pub tracking_id: ContactId,
    /// Touch-down point for floating zones; refreshed from layout for fixed zones
    pub origin: Point,
}

fn default_input_radius() -> f32 {
    DEFAULT_INPUT_RADIUS
}
fn default_visual_radius() -> f32 {
    DEFAULT_VISUAL_RADIUS
}
fn default_base_drag() -> f32 {
    DEFAULT_BASE_DRAG
}
fn default_sensitivity_scale() -> f32 {
    DEFAULT_SENSITIVITY_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_yaml_defaults() {
        let response: StickResponse = serde_yaml::from_str("mode: linear").unwrap();
        assert_eq!(
            response,
            StickResponse::Linear {
                base_drag: DEFAULT_BASE_DRAG,
                sensitivity_scale: DEFAULT_SENSITIVITY_SCALE,
                visual_radius: DEFAULT_VISUAL_RADIUS,
            }
        );
    }

    #[test]
    fn test_zone_from_yaml() {
        let yaml = r#"
id: "move"
stick: left
origin: floating
response:
  mode: polar
  input_radius: 80
"#;
        let zone: ZoneConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(zone.origin, OriginMode::Floating);
        assert_eq!(
            zone.response,
            StickResponse::Polar {
                input_radius: 80.0,
                visual_radius: DEFAULT_VISUAL_RADIUS
            }
        );
    }
}
