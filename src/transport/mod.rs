//! Relay transport: wire envelope and the WebSocket client channel

pub mod client;
pub mod wire;

pub use client::{
    ConnectionEvent, DropReason, SendOutcome, TransportBuilder, TransportChannel, TransportError,
};
pub use wire::{Envelope, ProtocolError, EVENT_INPUT, EVENT_MOBILE_INPUT};
