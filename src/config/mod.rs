//! Configuration management for Touchpad GW
//!
//! Handles loading, parsing, and validation of the optional YAML
//! configuration file. Every field has a default, so a missing file or an
//! empty document yields a working relay.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::gesture::{StickResponse, ZoneConfig};
use crate::hub::DEFAULT_PEER_BUFFER;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub gesture: GestureConfig,
}

/// HTTP / relay server configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
    /// Directory served as the control UI
    pub static_dir: String,
    /// Frames buffered per peer before new ones are dropped
    pub peer_buffer: usize,
    /// Settings database location; platform data dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
}

/// Channel liveness and buffering
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    pub ping_interval_ms: u64,
    pub ping_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
    /// Outbound frames a client may hold before sends are dropped
    pub send_buffer: usize,
}

/// Analog zone layout
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GestureConfig {
    pub zones: Vec<ZoneConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            static_dir: default_static_dir(),
            peer_buffer: DEFAULT_PEER_BUFFER,
            settings_path: None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: 1000,
            ping_timeout_ms: 3000,
            reconnect_delay_ms: 500,
            send_buffer: 1,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            zones: ZoneConfig::default_zones(),
        }
    }
}

impl TransportConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml(&contents).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Load the file if it exists, otherwise use defaults
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            info!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig = if contents.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.is_empty() {
            anyhow::bail!("server.bind cannot be empty");
        }
        if self.server.peer_buffer == 0 {
            anyhow::bail!("server.peer_buffer must be at least 1");
        }

        let transport = &self.transport;
        if transport.ping_interval_ms == 0 {
            anyhow::bail!("transport.ping_interval_ms must be greater than 0");
        }
        if transport.ping_timeout_ms <= transport.ping_interval_ms {
            anyhow::bail!(
                "transport.ping_timeout_ms ({}) must exceed ping_interval_ms ({})",
                transport.ping_timeout_ms,
                transport.ping_interval_ms
            );
        }
        if transport.send_buffer == 0 {
            anyhow::bail!("transport.send_buffer must be at least 1");
        }

        let mut seen = HashSet::new();
        for zone in &self.gesture.zones {
            if zone.id.is_empty() {
                anyhow::bail!("Gesture zone id cannot be empty");
            }
            if !seen.insert(zone.id.as_str()) {
                anyhow::bail!("Duplicate gesture zone id '{}'", zone.id);
            }
            Self::validate_response(&zone.id, &zone.response)?;
        }

        Ok(())
    }

    fn validate_response(zone_id: &str, response: &StickResponse) -> Result<()> {
        match *response {
            StickResponse::Polar {
                input_radius,
                visual_radius,
            } => {
                if input_radius <= 0.0 || visual_radius < 0.0 {
                    anyhow::bail!(
                        "Zone '{}' needs input_radius > 0 and visual_radius >= 0",
                        zone_id
                    );
                }
            }
            StickResponse::Linear {
                base_drag,
                sensitivity_scale,
                visual_radius,
            } => {
                if base_drag <= 0.0 || sensitivity_scale < 0.0 || visual_radius < 0.0 {
                    anyhow::bail!(
                        "Zone '{}' needs base_drag > 0 and non-negative scale/visual_radius",
                        zone_id
                    );
                }
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_port() -> u16 { 3000 }
fn default_bind() -> String { "0.0.0.0".to_string() }
fn default_static_dir() -> String { "public".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::OriginMode;
    use crate::input::StickId;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.gesture.zones.len(), 2);
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
server:
  port: 8080
transport:
  ping_timeout_ms: 5000
gesture:
  zones:
    - id: "move"
      stick: left
      origin: floating
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.static_dir, "public");
        assert_eq!(config.transport.ping_interval_ms, 1000);
        assert_eq!(config.transport.ping_timeout(), Duration::from_secs(5));

        let zone = &config.gesture.zones[0];
        assert_eq!(zone.stick, StickId::Left);
        assert_eq!(zone.origin, OriginMode::Floating);
        assert_eq!(zone.response, StickResponse::default());
    }

    #[test]
    fn test_rejects_timeout_shorter_than_interval() {
        let yaml = "transport:\n  ping_interval_ms: 2000\n  ping_timeout_ms: 1000\n";
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("ping_timeout_ms"));
    }

    #[test]
    fn test_rejects_duplicate_zone() {
        let mut config = AppConfig::default();
        config.gesture.zones.push(ZoneConfig::left_stick());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_radius() {
        let mut config = AppConfig::default();
        config.gesture.zones[0].response = StickResponse::Polar {
            input_radius: 0.0,
            visual_radius: 35.0,
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_file_and_missing_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "server:\n  port: 4000\n")?;

        let config = AppConfig::load(&config_path.to_string_lossy()).await?;
        assert_eq!(config.server.port, 4000);

        let missing = temp_dir.path().join("absent.yaml");
        let config = AppConfig::load_or_default(&missing.to_string_lossy()).await?;
        assert_eq!(config, AppConfig::default());

        Ok(())
    }
}
