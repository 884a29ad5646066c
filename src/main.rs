//! Touchpad GW - Rust implementation
//!
//! Relay server for the touchscreen gamepad, or a mirror client that logs
//! every relayed controller state.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use touchpad_gw::api::{self, ApiState};
use touchpad_gw::config::AppConfig;
use touchpad_gw::hub::RelayHub;
use touchpad_gw::paths::AppPaths;
use touchpad_gw::settings::SettingsStore;
use touchpad_gw::transport::TransportChannel;

/// Touchpad Gateway - relay a phone touchscreen gamepad to desktop receivers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (optional, defaults apply when missing)
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// HTTP port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Bind address
    #[arg(short, long, env = "BIND")]
    bind: Option<String>,

    /// Directory served as the control UI
    #[arg(long)]
    static_dir: Option<String>,

    /// Settings database location
    #[arg(long)]
    settings_path: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Connect to a relay as a receiver and log mirrored input
    #[arg(long, value_name = "WS_URL")]
    mirror: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting Touchpad GW v{}...", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load_or_default(&args.config).await?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration after CLI overrides")?;

    match args.mirror.as_deref() {
        Some(url) => run_mirror(url, &config).await?,
        None => run_server(config).await?,
    }

    info!("Touchpad GW shutdown complete");
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(dir) = &args.static_dir {
        config.server.static_dir = dir.clone();
    }
    if let Some(path) = &args.settings_path {
        config.server.settings_path = Some(path.clone());
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let settings = match open_settings(&config) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Settings storage unavailable, continuing without it: {:#}", e);
            None
        }
    };

    let state = Arc::new(ApiState {
        hub: Arc::new(RelayHub::new(config.server.peer_buffer)),
        liveness: config.transport.clone(),
        settings,
    });

    api::start_server(state, &config.server, shutdown_signal()).await
}

fn open_settings(config: &AppConfig) -> Result<SettingsStore> {
    let path = match &config.server.settings_path {
        Some(path) => PathBuf::from(path),
        None => {
            let paths = AppPaths::detect();
            paths.ensure_directories()?;
            paths.settings_db_path()
        }
    };

    info!("Settings database: {}", path.display());
    SettingsStore::open(path)
}

async fn run_mirror(url: &str, config: &AppConfig) -> Result<()> {
    let channel = TransportChannel::builder(url, config.transport.clone())
        .on_connect(|| info!("✅ Mirror connected"))
        .on_disconnect(|| warn!("Mirror disconnected, retrying"))
        .on_receive(|state| {
            info!(
                "ls=({:+.2}, {:+.2}) rs=({:+.2}, {:+.2}) buttons={:?}",
                state.left_stick.x,
                state.left_stick.y,
                state.right_stick.x,
                state.right_stick.y,
                state.pressed_buttons().collect::<Vec<_>>()
            );
        })
        .connect()?;

    shutdown_signal().await;
    channel.close().await;
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
