//! Per-connection lifecycle: Connecting -> Connected -> Disconnected (terminal)

use tokio::sync::mpsc;

/// Connection identifier, unique for the life of the process
pub type PeerId = u64;

/// Lifecycle of one connection. Reconnects get a new `PeerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Connecting,
    Connected,
    Disconnected,
}

/// Hub-side handle of one connected peer
#[derive(Debug)]
pub struct PeerConnection {
    id: PeerId,
    state: PeerState,
    outbound: mpsc::Receiver<String>,
}

impl PeerConnection {
    pub(super) fn new(id: PeerId, outbound: mpsc::Receiver<String>) -> Self {
        Self {
            id,
            state: PeerState::Connecting,
            outbound,
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    /// Advance the lifecycle; Disconnected is terminal
    pub(super) fn transition(&mut self, next: PeerState) {
        self.state = match (self.state, next) {
            (PeerState::Disconnected, _) => PeerState::Disconnected,
            (PeerState::Connected, PeerState::Connecting) => PeerState::Connected,
            (_, next) => next,
        };
    }

    /// Next frame relayed to this peer; `None` once the hub dropped it
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_is_terminal() {
        let (_tx, rx) = mpsc::channel(1);
        let mut peer = PeerConnection::new(1, rx);
        assert_eq!(peer.state(), PeerState::Connecting);

        peer.transition(PeerState::Connected);
        peer.transition(PeerState::Connecting);
        assert_eq!(peer.state(), PeerState::Connected);

        peer.transition(PeerState::Disconnected);
        peer.transition(PeerState::Connected);
        assert_eq!(peer.state(), PeerState::Disconnected);
    }
}
