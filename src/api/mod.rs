//! HTTP surface: relay WebSocket, health probe, settings, and static UI
//!
//! Default port: 3000

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{Instant, MissedTickBehavior};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::config::{ServerConfig, TransportConfig};
use crate::hub::RelayHub;
use crate::settings::{ControllerSettings, SettingsStore};

/// Shared state for API handlers
pub struct ApiState {
    /// Fan-out point for every WebSocket peer
    pub hub: Arc<RelayHub>,
    /// Heartbeat policy applied to peers
    pub liveness: TransportConfig,
    /// Persisted controller preferences (absent: settings routes return 404)
    pub settings: Option<SettingsStore>,
}

/// API error response
#[derive(Debug, Serialize)]
struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Build the application router
pub fn build_router(state: Arc<ApiState>, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/ws", get(relay_ws))
        .route("/health", get(health_check))
        .route("/api/settings", get(get_settings).put(put_settings));

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// GET /health - liveness probe
async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// GET /api/settings - stored controller preferences
async fn get_settings(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ControllerSettings>, ApiError> {
    let store = settings_store(&state)?;
    Ok(Json(store.load()))
}

/// PUT /api/settings - replace controller preferences
async fn put_settings(
    State(state): State<Arc<ApiState>>,
    Json(settings): Json<ControllerSettings>,
) -> Result<Json<ControllerSettings>, ApiError> {
    let store = settings_store(&state)?;
    let settings = settings.sanitized();

    if let Err(e) = store.save(&settings) {
        error!("Failed to save controller settings: {:#}", e);
        return Err(ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: format!("Failed to save settings: {}", e),
        });
    }

    info!("Controller settings updated: {:?}", settings);
    Ok(Json(settings))
}

fn settings_store(state: &ApiState) -> Result<&SettingsStore, ApiError> {
    state.settings.as_ref().ok_or_else(|| ApiError {
        status: StatusCode::NOT_FOUND,
        error: "Settings storage is disabled".to_string(),
    })
}

/// GET /ws - relay channel
async fn relay_ws(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_peer(socket, state))
}

/// Pump one peer: inbound frames to the hub, relayed frames to the socket
async fn handle_peer(mut socket: WebSocket, state: Arc<ApiState>) {
    let hub = &state.hub;
    let mut peer = hub.connect();
    let peer_id = peer.id();

    let mut heartbeat = tokio::time::interval(state.liveness.ping_interval());
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            frame = peer.recv() => {
                match frame {
                    Some(text) => {
                        if socket.send(Message::Text(text)).await.is_err() {
                            debug!("Peer {} send failed", peer_id);
                            break;
                        }
                    }
                    None => break,
                }
            }
            result = socket.recv() => {
                last_seen = Instant::now();
                match result {
                    Some(Ok(Message::Text(text))) => {
                        hub.on_text(peer_id, &text);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Peer {} closed connection", peer_id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Pong and binary frames only refresh liveness
                    }
                    Some(Err(e)) => {
                        debug!("Peer {} socket error: {}", peer_id, e);
                        break;
                    }
                }
            }
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > state.liveness.ping_timeout() {
                    warn!("Peer {} unresponsive for {:?}, dropping", peer_id, last_seen.elapsed());
                    break;
                }
                if socket.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.disconnect(&mut peer);
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Bind according to `config` and serve
pub async fn start_server(
    state: Arc<ApiState>,
    config: &ServerConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let static_dir = Path::new(&config.static_dir);
    if !static_dir.is_dir() {
        warn!("Static directory {} not found, UI will not be served", static_dir.display());
    }
    let router = build_router(state, Some(static_dir));

    let listener = TcpListener::bind((config.bind.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.bind, config.port))?;

    info!("Server running on http://{}", listener.local_addr()?);

    serve(listener, router, shutdown).await
}
