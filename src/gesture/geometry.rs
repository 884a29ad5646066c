//! Layout primitives: points, rectangles, and event targets.

use std::collections::HashMap;

use super::zone::ZoneId;

/// A position in layout (client) coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Displacement `self - origin`
    pub fn delta_from(&self, origin: Point) -> (f32, f32) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// Axis-aligned bounding rectangle of a zone element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Source of current zone geometry.
///
/// Queried on every start/move so layout reflow never desynchronizes input.
pub trait ZoneLayout {
    fn zone_rect(&self, zone: &str) -> Option<Rect>;
}

/// Fixed rectangles keyed by zone id
#[derive(Debug, Clone, Default)]
pub struct StaticLayout {
    rects: HashMap<ZoneId, Rect>,
}

impl StaticLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, zone: impl Into<ZoneId>, rect: Rect) -> Self {
        self.rects.insert(zone.into(), rect);
        self
    }

    pub fn set_zone(&mut self, zone: impl Into<ZoneId>, rect: Rect) {
        self.rects.insert(zone.into(), rect);
    }
}

impl ZoneLayout for StaticLayout {
    fn zone_rect(&self, zone: &str) -> Option<Rect> {
        self.rects.get(zone).copied()
    }
}

/// Kind of element found along an event target's ancestry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A pressable control (face button, steer button)
    Button,
    /// A region drawn over a zone that owns its own touches
    Overlay,
    /// Anything else (zone surface, decoration)
    Surface,
}

/// Target of a touch event, innermost element first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTarget {
    pub ancestry: Vec<ElementKind>,
}

impl EventTarget {
    /// Plain zone surface
    pub fn surface() -> Self {
        Self {
            ancestry: vec![ElementKind::Surface],
        }
    }

    pub fn from_ancestry(ancestry: Vec<ElementKind>) -> Self {
        Self { ancestry }
    }

    /// True if the target or any ancestor is a button or overlay
    pub fn is_interactive(&self) -> bool {
        self.ancestry
            .iter()
            .any(|kind| matches!(kind, ElementKind::Button | ElementKind::Overlay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.center(), Point::new(60.0, 45.0));
    }

    #[test]
    fn test_interactive_ancestry() {
        assert!(!EventTarget::surface().is_interactive());
        assert!(EventTarget::from_ancestry(vec![ElementKind::Surface, ElementKind::Button])
            .is_interactive());
        assert!(EventTarget::from_ancestry(vec![ElementKind::Overlay]).is_interactive());
    }
}
