//! Relay channel client
//!
//! Maintains one WebSocket connection to the hub on a background task and
//! reconnects on failure. Sends are volatile: a snapshot that cannot be handed
//! to the socket right now is dropped, never queued behind older ones.

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use super::wire::{decode_mobile_input, encode_input, ProtocolError};
use crate::config::TransportConfig;
use crate::dispatch::Dispatcher;
use crate::input::{InputSink, InputState};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors raised while setting up a channel
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid relay url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Why a volatile send was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No live connection (connecting or reconnecting)
    Disconnected,
    /// The outbound slot is still occupied by an unsent frame
    Backpressure,
    /// The channel task has stopped
    Closed,
    /// The snapshot could not be encoded
    Encode,
}

/// Result of a volatile send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Dropped(DropReason),
}

/// Connection lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
}

/// State shared between the channel handle and its task
#[derive(Default)]
struct Shared {
    connected: AtomicBool,
    received: Dispatcher<InputState>,
    lifecycle: Dispatcher<ConnectionEvent>,
}

impl Shared {
    fn set_connected(&self, connected: bool) {
        let was = self.connected.swap(connected, Ordering::SeqCst);
        if was == connected {
            return;
        }

        let event = if connected {
            ConnectionEvent::Connected
        } else {
            ConnectionEvent::Disconnected
        };
        self.lifecycle.dispatch(&event);
    }

    fn deliver(&self, text: &str) {
        match decode_mobile_input(text) {
            Ok(state) => self.received.dispatch(&state),
            Err(ProtocolError::UnexpectedEvent(event)) => {
                trace!("Ignoring relay event '{}'", event);
            }
            Err(e) => {
                debug!("Ignoring malformed relay frame: {}", e);
            }
        }
    }
}

/// Registers handlers before the connection task starts
pub struct TransportBuilder {
    url: String,
    config: TransportConfig,
    shared: Arc<Shared>,
}

impl TransportBuilder {
    /// Handler for every delivered `mobile-input` snapshot, in arrival order
    pub fn on_receive<F>(self, handler: F) -> Self
    where
        F: Fn(&InputState) + Send + Sync + 'static,
    {
        self.shared.received.subscribe(handler);
        self
    }

    pub fn on_connect<F>(self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.lifecycle.subscribe(move |event| {
            if *event == ConnectionEvent::Connected {
                handler();
            }
        });
        self
    }

    pub fn on_disconnect<F>(self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.lifecycle.subscribe(move |event| {
            if *event == ConnectionEvent::Disconnected {
                handler();
            }
        });
        self
    }

    /// Spawn the connection task. Must be called inside a Tokio runtime.
    pub fn connect(self) -> Result<TransportChannel, TransportError> {
        validate_url(&self.url)?;

        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.send_buffer.max(1));
        let task = tokio::spawn(run_connection(
            self.url.clone(),
            self.config,
            outbound_rx,
            Arc::clone(&self.shared),
        ));

        info!("Relay channel started for {}", self.url);

        Ok(TransportChannel {
            outbound: outbound_tx,
            shared: self.shared,
            task: Some(task),
        })
    }
}

/// Handle to a live relay channel
pub struct TransportChannel {
    outbound: mpsc::Sender<String>,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl TransportChannel {
    pub fn builder(url: impl Into<String>, config: TransportConfig) -> TransportBuilder {
        TransportBuilder {
            url: url.into(),
            config,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Volatile send of the whole snapshot
    pub fn send(&self, state: &InputState) -> SendOutcome {
        if !self.is_connected() {
            return SendOutcome::Dropped(DropReason::Disconnected);
        }

        let frame = match encode_input(state) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode input state: {}", e);
                return SendOutcome::Dropped(DropReason::Encode);
            }
        };

        match self.outbound.try_send(frame) {
            Ok(()) => SendOutcome::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!("Relay channel backed up, dropping snapshot");
                SendOutcome::Dropped(DropReason::Backpressure)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Dropped(DropReason::Closed),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Add a receive handler after start
    pub fn on_receive<F>(&self, handler: F)
    where
        F: Fn(&InputState) + Send + Sync + 'static,
    {
        self.shared.received.subscribe(handler);
    }

    /// Close the socket and wait for the task to finish
    pub async fn close(mut self) {
        let task = self.task.take();
        drop(self);

        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl InputSink for TransportChannel {
    fn emit(&mut self, state: &InputState) {
        let _ = self.send(state);
    }
}

fn validate_url(url: &str) -> Result<(), TransportError> {
    let uri = url.parse::<Uri>().map_err(|e| TransportError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match uri.scheme_str() {
        Some("ws") | Some("wss") => Ok(()),
        other => Err(TransportError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}

/// Connect, serve, and reconnect until the owning handle goes away
async fn run_connection(
    url: String,
    config: TransportConfig,
    mut outbound: mpsc::Receiver<String>,
    shared: Arc<Shared>,
) {
    loop {
        match attempt(&url, &config, &mut outbound).await {
            Attempt::Connected(socket) => {
                // Anything queued before this connection is stale
                while outbound.try_recv().is_ok() {}

                info!("Connected to relay at {}", url);
                shared.set_connected(true);

                let owner_closed = serve(socket, &mut outbound, &shared, &config).await;

                shared.set_connected(false);
                if owner_closed {
                    debug!("Relay channel closed by owner");
                    return;
                }
                info!("Disconnected from relay, retrying in {:?}", config.reconnect_delay());
            }
            Attempt::Failed => {}
            Attempt::OwnerGone => {
                debug!("Relay channel closed while connecting");
                return;
            }
        }

        if !backoff(&mut outbound, config.reconnect_delay()).await {
            debug!("Relay channel closed by owner");
            return;
        }
    }
}

enum Attempt {
    Connected(Socket),
    Failed,
    OwnerGone,
}

/// One handshake, bounded by the ping timeout and abandoned if the owner
/// drops the channel meanwhile
async fn attempt(
    url: &str,
    config: &TransportConfig,
    outbound: &mut mpsc::Receiver<String>,
) -> Attempt {
    let connect = tokio::time::timeout(config.ping_timeout(), connect_async(url));
    tokio::pin!(connect);

    loop {
        tokio::select! {
            result = &mut connect => {
                return match result {
                    Ok(Ok((socket, _response))) => Attempt::Connected(socket),
                    Ok(Err(e)) => {
                        debug!("Relay connection to {} failed: {}", url, e);
                        Attempt::Failed
                    }
                    Err(_) => {
                        warn!("Relay handshake with {} timed out after {:?}", url, config.ping_timeout());
                        Attempt::Failed
                    }
                };
            }
            frame = outbound.recv() => {
                if frame.is_none() {
                    return Attempt::OwnerGone;
                }
            }
        }
    }
}

/// Wait out the reconnect delay. Returns false once the owner is gone.
async fn backoff(outbound: &mut mpsc::Receiver<String>, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            frame = outbound.recv() => {
                if frame.is_none() {
                    return false;
                }
            }
        }
    }
}

/// Pump one connection. Returns true when the owner dropped the channel.
async fn serve(
    mut socket: Socket,
    outbound: &mut mpsc::Receiver<String>,
    shared: &Shared,
    config: &TransportConfig,
) -> bool {
    let mut heartbeat = tokio::time::interval(config.ping_interval());
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = socket.send(Message::Text(text)).await {
                        debug!("Relay send failed: {}", e);
                        return false;
                    }
                }
                None => {
                    let _ = socket.close(None).await;
                    return true;
                }
            },
            incoming = socket.next() => {
                last_seen = Instant::now();
                match incoming {
                    Some(Ok(Message::Text(text))) => shared.deliver(&text),
                    Some(Ok(Message::Close(_))) | None => return false,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Relay socket error: {}", e);
                        return false;
                    }
                }
            }
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > config.ping_timeout() {
                    warn!("Relay silent for {:?}, dropping connection", last_seen.elapsed());
                    return false;
                }
                if socket.send(Message::Ping(Vec::new())).await.is_err() {
                    return false;
                }
            }
        }
    }
}
