//! Per-zone multi-touch tracking
//!
//! Each zone owns at most one contact, identified by its platform touch id.
//! Start events on a busy zone are ignored; move/end/cancel events are matched
//! by id, never by position, so several fingers can share the screen.

use std::collections::HashMap;
use tracing::{debug, trace};

use super::geometry::{EventTarget, Point, ZoneLayout};
use super::zone::{ContactId, OriginMode, StickResponse, TouchSession, ZoneConfig, ZoneId};
use crate::input::stick::{
    linear_drag, max_drag_for_sensitivity, normalize_polar, visual_offset, StickId, StickVector,
    VisualOffset,
};

/// Touch event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// One physical contact point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub position: Point,
}

impl Contact {
    pub fn new(id: ContactId, x: f32, y: f32) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

/// A raw touch event delivered to a zone
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub target: EventTarget,
    /// Contacts that changed in this event
    pub changed: Vec<Contact>,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, changed: Vec<Contact>) -> Self {
        Self {
            phase,
            target: EventTarget::surface(),
            changed,
        }
    }

    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = target;
        self
    }

    fn find(&self, id: ContactId) -> Option<&Contact> {
        self.changed.iter().find(|c| c.id == id)
    }
}

/// Per-event inputs that live outside the tracker
pub struct GestureContext<'a> {
    pub layout: &'a dyn ZoneLayout,
    /// Aim sensitivity, consulted by linear zones
    pub sensitivity: f32,
}

/// What a handled event did to its zone
#[derive(Debug, Clone, PartialEq)]
pub enum GestureUpdate {
    /// A floating zone took ownership of a contact; no input change yet
    Anchored {
        zone: ZoneId,
        stick: StickId,
        origin: Point,
    },
    /// The stick moved
    Moved {
        stick: StickId,
        vector: StickVector,
        visual: VisualOffset,
    },
    /// The owned contact ended; the stick must return to center
    Released { stick: StickId },
}

struct ZoneSlot {
    config: ZoneConfig,
    session: Option<TouchSession>,
}

/// Multi-zone gesture tracker (zone-id -> Option<TouchSession>)
pub struct GestureTracker {
    zones: HashMap<ZoneId, ZoneSlot>,
}

impl GestureTracker {
    pub fn new(configs: Vec<ZoneConfig>) -> Self {
        let zones = configs
            .into_iter()
            .map(|config| {
                (
                    config.id.clone(),
                    ZoneSlot {
                        config,
                        session: None,
                    },
                )
            })
            .collect();

        Self { zones }
    }

    /// Route one event to `zone`. Returns `None` when the event is ignored.
    pub fn handle(
        &mut self,
        zone: &str,
        event: &TouchEvent,
        ctx: &GestureContext<'_>,
    ) -> Option<GestureUpdate> {
        if event.changed.is_empty() {
            trace!("Zone {}: empty touch list, ignoring", zone);
            return None;
        }

        if event.target.is_interactive() {
            trace!("Zone {}: target is an interactive control, ignoring", zone);
            return None;
        }

        let Some(slot) = self.zones.get_mut(zone) else {
            debug!("Touch event for unknown zone: {}", zone);
            return None;
        };

        match event.phase {
            TouchPhase::Start => slot.start(event, ctx),
            TouchPhase::Move => slot.update(event, ctx),
            TouchPhase::End | TouchPhase::Cancel => slot.end(event),
        }
    }

    /// Drop the zone's contact without an end event (e.g. zone hidden).
    ///
    /// Returns the stick that needs re-centering if a contact was held.
    pub fn release_zone(&mut self, zone: &str) -> Option<StickId> {
        let slot = self.zones.get_mut(zone)?;
        slot.session.take().map(|_| slot.config.stick)
    }

    pub fn session(&self, zone: &str) -> Option<&TouchSession> {
        self.zones.get(zone).and_then(|slot| slot.session.as_ref())
    }

    pub fn zone_config(&self, zone: &str) -> Option<&ZoneConfig> {
        self.zones.get(zone).map(|slot| &slot.config)
    }

    /// Zone ids bound to `stick`
    pub fn zones_for_stick(&self, stick: StickId) -> impl Iterator<Item = &str> {
        self.zones
            .values()
            .filter(move |slot| slot.config.stick == stick)
            .map(|slot| slot.config.id.as_str())
    }
}

impl ZoneSlot {
    fn start(&mut self, event: &TouchEvent, ctx: &GestureContext<'_>) -> Option<GestureUpdate> {
        if self.session.is_some() {
            trace!("Zone {} already tracking a contact, ignoring start", self.config.id);
            return None;
        }

        let contact = event.changed[0];

        match self.config.origin {
            OriginMode::Fixed => {
                let origin = self.layout_origin(ctx)?;
                self.session = Some(TouchSession {
                    tracking_id: contact.id,
                    origin,
                });
                Some(self.moved(contact.position, origin, ctx.sensitivity))
            }
            OriginMode::Floating => {
                let origin = contact.position;
                self.session = Some(TouchSession {
                    tracking_id: contact.id,
                    origin,
                });
                Some(GestureUpdate::Anchored {
                    zone: self.config.id.clone(),
                    stick: self.config.stick,
                    origin,
                })
            }
        }
    }

    fn update(&mut self, event: &TouchEvent, ctx: &GestureContext<'_>) -> Option<GestureUpdate> {
        let session = self.session?;
        let contact = event.find(session.tracking_id)?;

        let origin = match self.config.origin {
            OriginMode::Fixed => {
                let origin = self.layout_origin(ctx)?;
                self.session = Some(TouchSession { origin, ..session });
                origin
            }
            OriginMode::Floating => session.origin,
        };

        Some(self.moved(contact.position, origin, ctx.sensitivity))
    }

    fn end(&mut self, event: &TouchEvent) -> Option<GestureUpdate> {
        let session = self.session?;
        event.find(session.tracking_id)?;

        self.session = None;
        Some(GestureUpdate::Released {
            stick: self.config.stick,
        })
    }

    fn layout_origin(&self, ctx: &GestureContext<'_>) -> Option<Point> {
        match ctx.layout.zone_rect(&self.config.id) {
            Some(rect) => Some(rect.center()),
            None => {
                debug!("No layout for zone {}, ignoring touch", self.config.id);
                None
            }
        }
    }

    fn moved(&self, position: Point, origin: Point, sensitivity: f32) -> GestureUpdate {
        let (dx, dy) = position.delta_from(origin);

        let vector = match self.config.response {
            StickResponse::Polar { input_radius, .. } => normalize_polar(dx, dy, input_radius),
            StickResponse::Linear {
                base_drag,
                sensitivity_scale,
                ..
            } => {
                let max_drag = max_drag_for_sensitivity(base_drag, sensitivity, sensitivity_scale);
                linear_drag(dx, dy, max_drag)
            }
        };

        GestureUpdate::Moved {
            stick: self.config.stick,
            vector,
            visual: visual_offset(dx, dy, self.config.response.visual_radius()),
        }
    }
}
