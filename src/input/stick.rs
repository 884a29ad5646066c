//! Stick vector math shared by every gesture mode.
//!
//! Converts a raw touch displacement (in layout units) into a stick vector
//! whose magnitude never exceeds 1.0.
//!
//! # Key Functions
//!
//! - [`normalize_polar`]: circular saturation, used by both stick zones by default
//! - [`linear_drag`]: independent per-axis clamp, used by the aim zone
//! - [`visual_offset`]: on-screen knob offset, never fed back into input

use serde::{Deserialize, Serialize};

/// Saturation radius for full deflection of the movement stick.
pub const DEFAULT_INPUT_RADIUS: f32 = 65.0;

/// Maximum on-screen travel of a stick knob.
pub const DEFAULT_VISUAL_RADIUS: f32 = 35.0;

/// Drag span of the aim zone before sensitivity is applied.
pub const DEFAULT_BASE_DRAG: f32 = 150.0;

/// Drag units removed per point of aim sensitivity.
pub const DEFAULT_SENSITIVITY_SCALE: f32 = 10.0;

/// Lower bound on the linear drag span (keeps the division finite).
pub const MIN_DRAG: f32 = 1.0;

/// Stick identifier
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickId {
    Left,
    Right,
}

impl StickId {
    /// Short wire name ("ls" / "rs")
    pub fn as_str(&self) -> &'static str {
        match self {
            StickId::Left => "ls",
            StickId::Right => "rs",
        }
    }
}

/// A 2D stick vector, each axis in [-1.0, 1.0] and magnitude <= 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StickVector {
    pub x: f32,
    pub y: f32,
}

impl StickVector {
    pub const ZERO: StickVector = StickVector { x: 0.0, y: 0.0 };

    /// Build a vector, clamping it back onto the unit circle if needed.
    pub fn new(x: f32, y: f32) -> Self {
        let (x, y) = radial_clamp(x, y);
        Self { x, y }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// On-screen offset of a stick knob, in layout units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisualOffset {
    pub dx: f32,
    pub dy: f32,
}

/// Clamp input to unit circle.
///
/// Interior positions are preserved exactly; anything outside is scaled back
/// to magnitude 1.0. Non-finite input collapses to zero.
pub fn radial_clamp(x: f32, y: f32) -> (f32, f32) {
    if !x.is_finite() || !y.is_finite() {
        return (0.0, 0.0);
    }

    let magnitude = (x * x + y * y).sqrt();

    if magnitude <= 1.0 {
        (x, y)
    } else {
        (x / magnitude, y / magnitude)
    }
}

/// Polar normalization with circular saturation.
///
/// `min(|d| / input_radius, 1.0)` in the direction of `atan2(dy, dx)`.
///
/// # Example
/// ```
/// use touchpad_gw::input::stick::normalize_polar;
///
/// let v = normalize_polar(32.5, 0.0, 65.0);
/// assert!((v.x - 0.5).abs() < 1e-6);
/// assert_eq!(v.y, 0.0);
/// ```
pub fn normalize_polar(dx: f32, dy: f32, input_radius: f32) -> StickVector {
    if input_radius <= 0.0 {
        return StickVector::ZERO;
    }

    let distance = (dx * dx + dy * dy).sqrt();
    let angle = dy.atan2(dx);
    let normalized = (distance / input_radius).min(1.0);

    StickVector::new(angle.cos() * normalized, angle.sin() * normalized)
}

/// Knob offset, clamped to `visual_radius` along the drag direction.
pub fn visual_offset(dx: f32, dy: f32, visual_radius: f32) -> VisualOffset {
    let distance = (dx * dx + dy * dy).sqrt();
    let angle = dy.atan2(dx);
    let clamped = distance.min(visual_radius.max(0.0));

    VisualOffset {
        dx: angle.cos() * clamped,
        dy: angle.sin() * clamped,
    }
}

/// Per-axis linear drag: `clamp(d / max_drag, -1, 1)` on each axis.
///
/// Corners of the drag square would exceed magnitude 1.0, so the result is
/// passed through [`radial_clamp`] like every other stick write.
pub fn linear_drag(dx: f32, dy: f32, max_drag: f32) -> StickVector {
    let span = max_drag.max(MIN_DRAG);
    let x = (dx / span).clamp(-1.0, 1.0);
    let y = (dy / span).clamp(-1.0, 1.0);
    StickVector::new(x, y)
}

/// `base_drag - sensitivity * scale`; higher sensitivity means a shorter drag.
pub fn max_drag_for_sensitivity(base_drag: f32, sensitivity: f32, scale: f32) -> f32 {
    (base_drag - sensitivity * scale).max(MIN_DRAG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_polar_full_deflection_at_radius() {
        let v = normalize_polar(65.0, 0.0, DEFAULT_INPUT_RADIUS);
        assert!((v.x - 1.0).abs() < 1e-6);
        assert!(v.y.abs() < 1e-6);
    }

    #[test]
    fn test_polar_half_deflection() {
        let v = normalize_polar(32.5, 0.0, DEFAULT_INPUT_RADIUS);
        assert!((v.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_polar_saturates_beyond_radius() {
        let v = normalize_polar(0.0, -400.0, DEFAULT_INPUT_RADIUS);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_polar_centered_is_zero() {
        let v = normalize_polar(0.0, 0.0, DEFAULT_INPUT_RADIUS);
        assert_eq!(v.magnitude(), 0.0);
    }

    #[test]
    fn test_visual_offset_uses_smaller_clamp() {
        let off = visual_offset(65.0, 0.0, DEFAULT_VISUAL_RADIUS);
        assert!((off.dx - 35.0).abs() < 1e-4);

        let off = visual_offset(10.0, 0.0, DEFAULT_VISUAL_RADIUS);
        assert!((off.dx - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_drag_per_axis() {
        let v = linear_drag(50.0, -20.0, 100.0);
        assert!((v.x - 0.5).abs() < 1e-6);
        assert!((v.y + 0.2).abs() < 1e-6);

        let v = linear_drag(-500.0, 0.0, 100.0);
        assert_eq!(v.x, -1.0);
    }

    #[test]
    fn test_linear_drag_corner_is_clamped_to_circle() {
        let v = linear_drag(300.0, 300.0, 100.0);
        assert!((v.magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sensitivity_shortens_drag() {
        assert_eq!(max_drag_for_sensitivity(150.0, 5.0, 10.0), 100.0);
        assert!(max_drag_for_sensitivity(150.0, 8.0, 10.0) < 100.0);
        assert_eq!(max_drag_for_sensitivity(150.0, 100.0, 10.0), MIN_DRAG);
    }

    #[test]
    fn test_radial_clamp_rejects_nan() {
        assert_eq!(radial_clamp(f32::NAN, 0.5), (0.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_polar_magnitude_bounded(dx in -2000.0f32..2000.0, dy in -2000.0f32..2000.0) {
            let v = normalize_polar(dx, dy, DEFAULT_INPUT_RADIUS);
            prop_assert!(v.magnitude() <= 1.0 + 1e-6);
        }

        #[test]
        fn prop_polar_matches_saturated_distance(dx in -500.0f32..500.0, dy in -500.0f32..500.0) {
            let v = normalize_polar(dx, dy, DEFAULT_INPUT_RADIUS);
            let expected = ((dx * dx + dy * dy).sqrt() / DEFAULT_INPUT_RADIUS).min(1.0);
            prop_assert!((v.magnitude() - expected).abs() < 1e-4);

            // Same direction as the displacement
            if expected > 1e-3 {
                let cross = v.x * dy - v.y * dx;
                let dot = v.x * dx + v.y * dy;
                prop_assert!(cross.abs() < 1e-2 * (dx.abs() + dy.abs()));
                prop_assert!(dot >= 0.0);
            }
        }

        #[test]
        fn prop_linear_drag_bounded(dx in -2000.0f32..2000.0, dy in -2000.0f32..2000.0, drag in 0.0f32..300.0) {
            let v = linear_drag(dx, dy, drag);
            prop_assert!(v.x.abs() <= 1.0);
            prop_assert!(v.y.abs() <= 1.0);
            prop_assert!(v.magnitude() <= 1.0 + 1e-6);
        }
    }
}
