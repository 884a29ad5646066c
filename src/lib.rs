//! Touchpad GW - touchscreen gamepad relay
//!
//! A phone browser turns touches into a gamepad [`input::InputState`] and
//! streams it over WebSocket to a relay hub, which fans each snapshot out to
//! every other connected peer (typically a desktop receiver).

pub mod api;
pub mod config;
pub mod dispatch;
pub mod gesture;
pub mod hub;
pub mod input;
pub mod paths;
pub mod session;
pub mod settings;
pub mod transport;
