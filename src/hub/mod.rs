//! Relay hub - broadcast-exclude-sender fan-out
//!
//! The hub keeps nothing but the set of connected peers. An `input` frame
//! from one peer is re-wrapped as `mobile-input` and offered to every other
//! peer with a non-blocking send; a peer whose outbound buffer is full misses
//! that frame rather than delaying anyone else.

mod peer;

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::transport::wire::{relay_frame, Envelope, EVENT_INPUT};

pub use peer::{PeerConnection, PeerId, PeerState};

/// Default per-peer outbound buffer
pub const DEFAULT_PEER_BUFFER: usize = 4;

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers the frame was handed to
    pub delivered: usize,
    /// Peers that were backed up or already gone
    pub dropped: usize,
}

/// Process-wide connection registry and fan-out point
pub struct RelayHub {
    peers: DashMap<PeerId, mpsc::Sender<String>>,
    next_id: AtomicU64,
    peer_buffer: usize,
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_BUFFER)
    }
}

impl RelayHub {
    pub fn new(peer_buffer: usize) -> Self {
        Self {
            peers: DashMap::new(),
            next_id: AtomicU64::new(1),
            peer_buffer: peer_buffer.max(1),
        }
    }

    /// Register a new peer and return its handle (state: Connected)
    pub fn connect(&self) -> PeerConnection {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.peer_buffer);

        let mut peer = PeerConnection::new(id, rx);
        self.peers.insert(id, tx);
        peer.transition(PeerState::Connected);

        info!("✅ Peer connected: {} ({} online)", id, self.peers.len());
        peer
    }

    /// Remove a peer from future broadcasts. No synthetic release is sent.
    pub fn disconnect(&self, peer: &mut PeerConnection) {
        if self.peers.remove(&peer.id()).is_some() {
            info!("❌ Peer disconnected: {} ({} online)", peer.id(), self.peers.len());
        }
        peer.transition(PeerState::Disconnected);
    }

    /// Handle one text frame from `from`.
    ///
    /// Returns `None` when the frame was ignored (not JSON, not an `input`
    /// event, or sent by a peer that is no longer connected).
    pub fn on_text(&self, from: PeerId, text: &str) -> Option<BroadcastReport> {
        if !self.peers.contains_key(&from) {
            trace!("Frame from disconnected peer {} ignored", from);
            return None;
        }

        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Peer {} sent a malformed frame: {}", from, e);
                return None;
            }
        };

        if envelope.event != EVENT_INPUT {
            debug!("Peer {} sent unknown event '{}'", from, envelope.event);
            return None;
        }

        Some(self.broadcast_from(from, &relay_frame(envelope.data)))
    }

    /// Offer `frame` to every connected peer except `from`
    pub fn broadcast_from(&self, from: PeerId, frame: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for entry in self.peers.iter() {
            if *entry.key() == from {
                continue;
            }

            match entry.value().try_send(frame.to_string()) {
                Ok(()) => report.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    trace!("Peer {} backed up, dropping frame", entry.key());
                    report.dropped += 1;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Its socket task is exiting and will disconnect it
                    report.dropped += 1;
                }
            }
        }

        report
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn is_connected(&self, id: PeerId) -> bool {
        self.peers.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const INPUT: &str =
        r#"{"event":"input","data":{"ls":{"x":0.5,"y":0},"rs":{"x":0,"y":0},"buttons":{}}}"#;

    fn parse(frame: &str) -> Value {
        serde_json::from_str(frame).unwrap()
    }

    #[test]
    fn test_broadcast_excludes_sender() {
        let hub = RelayHub::default();
        let mut sender = hub.connect();
        let mut r1 = hub.connect();
        let mut r2 = hub.connect();

        let report = hub.on_text(sender.id(), INPUT).unwrap();
        assert_eq!(report, BroadcastReport { delivered: 2, dropped: 0 });

        for receiver in [&mut r1, &mut r2] {
            let frame = parse(&receiver.try_recv().unwrap());
            assert_eq!(frame["event"], "mobile-input");
            assert_eq!(
                frame["data"],
                json!({"ls": {"x": 0.5, "y": 0}, "rs": {"x": 0, "y": 0}, "buttons": {}})
            );
            assert!(receiver.try_recv().is_none());
        }

        assert!(sender.try_recv().is_none());
    }

    #[test]
    fn test_disconnected_peer_is_skipped() {
        let hub = RelayHub::default();
        let sender = hub.connect();
        let mut gone = hub.connect();
        let mut stays = hub.connect();

        hub.disconnect(&mut gone);
        assert_eq!(gone.state(), PeerState::Disconnected);
        assert!(!hub.is_connected(gone.id()));

        let report = hub.on_text(sender.id(), INPUT).unwrap();
        assert_eq!(report.delivered, 1);
        assert!(stays.try_recv().is_some());
        assert!(gone.try_recv().is_none());
    }

    #[test]
    fn test_send_after_disconnect_is_silent() {
        let hub = RelayHub::default();
        let mut sender = hub.connect();
        let mut other = hub.connect();

        hub.disconnect(&mut sender);
        assert!(hub.on_text(sender.id(), INPUT).is_none());
        assert!(other.try_recv().is_none());
        assert_eq!(hub.peer_count(), 1);
    }

    #[test]
    fn test_backed_up_peer_drops_instead_of_queueing() {
        let hub = RelayHub::new(1);
        let sender = hub.connect();
        let mut slow = hub.connect();

        assert_eq!(hub.on_text(sender.id(), INPUT).unwrap().delivered, 1);
        let second = hub.on_text(sender.id(), INPUT).unwrap();
        assert_eq!(second, BroadcastReport { delivered: 0, dropped: 1 });

        assert!(slow.try_recv().is_some());
        assert!(slow.try_recv().is_none());
    }

    #[test]
    fn test_malformed_and_unknown_frames_are_ignored() {
        let hub = RelayHub::default();
        let sender = hub.connect();
        let mut receiver = hub.connect();

        assert!(hub.on_text(sender.id(), "not json at all").is_none());
        assert!(hub.on_text(sender.id(), r#"{"event":"chat","data":"hi"}"#).is_none());
        assert!(receiver.try_recv().is_none());

        // Payload shape is not validated
        let report = hub.on_text(sender.id(), r#"{"event":"input","data":[1,2,3]}"#).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(parse(&receiver.try_recv().unwrap())["data"], json!([1, 2, 3]));
    }

    #[test]
    fn test_reconnect_gets_new_identity() {
        let hub = RelayHub::default();
        let mut first = hub.connect();
        hub.disconnect(&mut first);
        let second = hub.connect();
        assert_ne!(first.id(), second.id());
    }
}
