//! Controller session - the live state of one controller UI instance
//!
//! Owns the canonical `InputState`, the gesture tracker, the drive-mode flag
//! and the current settings. Every mutation is followed immediately by an
//! emit of the whole snapshot to the sink; there is no batching.

pub mod drive;

use tracing::{debug, trace};

use crate::config::GestureConfig;
use crate::dispatch::Dispatcher;
use crate::gesture::{
    GestureContext, GestureTracker, GestureUpdate, Point, TouchEvent, ZoneConfig, ZoneId,
    ZoneLayout,
};
use crate::input::{InputSink, InputState, StickId, StickVector, VisualOffset};
use crate::settings::ControllerSettings;

pub use drive::{haptics, SteerControl};

/// Feedback for the UI layer (knob rendering, pressed styles, vibration)
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    StickMoved { stick: StickId, visual: VisualOffset },
    /// A floating zone's knob should be drawn at `origin`
    StickAnchored { zone: ZoneId, origin: Point },
    StickReleased { stick: StickId },
    ButtonPressed(String),
    ButtonReleased(String),
    SteerPressed(SteerControl),
    SteerReleased(SteerControl),
    DriveModeChanged(bool),
    Haptic(&'static [u32]),
}

/// One controller UI instance
pub struct ControllerSession<S: InputSink> {
    state: InputState,
    tracker: GestureTracker,
    settings: ControllerSettings,
    drive_mode: bool,
    sink: S,
    events: Dispatcher<ControlEvent>,
}

impl<S: InputSink> ControllerSession<S> {
    /// Session with the stock zone layout
    pub fn new(sink: S, settings: ControllerSettings) -> Self {
        Self::with_zones(sink, settings, ZoneConfig::default_zones())
    }

    /// Session with the zone layout from the configuration file
    pub fn from_config(sink: S, settings: ControllerSettings, gesture: &GestureConfig) -> Self {
        Self::with_zones(sink, settings, gesture.zones.clone())
    }

    pub fn with_zones(sink: S, settings: ControllerSettings, zones: Vec<ZoneConfig>) -> Self {
        Self {
            state: InputState::new(),
            tracker: GestureTracker::new(zones),
            settings: settings.sanitized(),
            drive_mode: false,
            sink,
            events: Dispatcher::new(),
        }
    }

    /// Feed a touch event to an analog zone
    pub fn handle_touch(
        &mut self,
        zone: &str,
        event: &TouchEvent,
        layout: &dyn ZoneLayout,
    ) -> Option<GestureUpdate> {
        if self.drive_mode
            && self
                .tracker
                .zone_config(zone)
                .is_some_and(|config| config.stick == StickId::Left)
        {
            trace!("Drive mode active, ignoring touch on {}", zone);
            return None;
        }

        let ctx = GestureContext {
            layout,
            sensitivity: self.settings.aim_sensitivity,
        };
        let update = self.tracker.handle(zone, event, &ctx)?;

        match &update {
            GestureUpdate::Moved {
                stick,
                vector,
                visual,
            } => {
                self.state.set_stick(*stick, *vector);
                self.events.dispatch(&ControlEvent::StickMoved {
                    stick: *stick,
                    visual: *visual,
                });
                self.emit();
            }
            GestureUpdate::Anchored { zone, origin, .. } => {
                self.events.dispatch(&ControlEvent::StickAnchored {
                    zone: zone.clone(),
                    origin: *origin,
                });
            }
            GestureUpdate::Released { stick } => {
                self.state.reset_stick(*stick);
                self.events
                    .dispatch(&ControlEvent::StickReleased { stick: *stick });
                self.emit();
            }
        }

        Some(update)
    }

    pub fn press_button(&mut self, id: &str) {
        self.state.set_button(id, true);
        self.events
            .dispatch(&ControlEvent::ButtonPressed(id.to_string()));
        self.emit();
        self.events
            .dispatch(&ControlEvent::Haptic(haptics::BUTTON_PRESS));
    }

    pub fn release_button(&mut self, id: &str) {
        self.state.set_button(id, false);
        self.events
            .dispatch(&ControlEvent::ButtonReleased(id.to_string()));
        self.emit();
    }

    /// Switch between stick and steer-button heading control
    pub fn toggle_drive_mode(&mut self) -> bool {
        self.drive_mode = !self.drive_mode;
        debug!("Drive mode: {}", self.drive_mode);

        if self.drive_mode {
            let left_zones: Vec<String> = self
                .tracker
                .zones_for_stick(StickId::Left)
                .map(str::to_string)
                .collect();
            let mut dropped = false;
            for zone in left_zones {
                dropped |= self.tracker.release_zone(&zone).is_some();
            }

            self.events.dispatch(&ControlEvent::DriveModeChanged(true));
            if dropped {
                self.state.reset_stick(StickId::Left);
                self.emit();
            }
            self.events
                .dispatch(&ControlEvent::Haptic(haptics::DRIVE_MODE_ON));
        } else {
            self.events.dispatch(&ControlEvent::DriveModeChanged(false));
            self.events
                .dispatch(&ControlEvent::Haptic(haptics::DRIVE_MODE_OFF));
            self.state.reset_stick(StickId::Left);
            self.emit();
        }

        self.drive_mode
    }

    pub fn press_steer(&mut self, control: SteerControl) {
        if !self.drive_mode {
            debug!("Steer {:?} pressed outside drive mode, ignoring", control);
            return;
        }

        self.state
            .set_stick(StickId::Left, StickVector::new(control.axis_value(), 0.0));
        self.events.dispatch(&ControlEvent::SteerPressed(control));
        self.emit();
        self.events
            .dispatch(&ControlEvent::Haptic(haptics::STEER_PRESS));
    }

    /// Release (or cancel) of any steer control zeroes the heading
    pub fn release_steer(&mut self, control: SteerControl) {
        if !self.drive_mode {
            return;
        }

        self.state.reset_stick(StickId::Left);
        self.events.dispatch(&ControlEvent::SteerReleased(control));
        self.emit();
    }

    pub fn apply_settings(&mut self, settings: ControllerSettings) {
        self.settings = settings.sanitized();
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn is_drive_mode(&self) -> bool {
        self.drive_mode
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    /// UI feedback subscriptions
    pub fn events(&self) -> &Dispatcher<ControlEvent> {
        &self.events
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn emit(&mut self) {
        self.sink.emit(&self.state);
    }
}
