//! Touch gesture interpretation
//!
//! Maps raw multi-touch events to clamped stick vectors, one zone per stick.

pub mod geometry;
pub mod tracker;
pub mod zone;

pub use geometry::{ElementKind, EventTarget, Point, Rect, StaticLayout, ZoneLayout};
pub use tracker::{Contact, GestureContext, GestureTracker, GestureUpdate, TouchEvent, TouchPhase};
pub use zone::{
    ContactId, OriginMode, StickResponse, TouchSession, ZoneConfig, ZoneId, LEFT_STICK_ZONE,
    RIGHT_ZONE,
};
