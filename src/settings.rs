//! Controller UI preferences with sled persistence
//!
//! Stored as one camelCase JSON document under a single key. Loading never
//! fails: a missing or corrupt entry falls back to defaults with a warning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Key of the settings document in the sled database
const SETTINGS_KEY: &str = "controller_settings";

pub const MIN_SENSITIVITY: f32 = 1.0;
pub const MAX_SENSITIVITY: f32 = 10.0;

/// Persisted controller preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerSettings {
    /// Stick base diameter, layout units
    pub joystick_size: f32,
    /// Face button diameter, layout units
    pub button_size: f32,
    /// Aim sensitivity, 1 (slow) to 10 (fast)
    pub aim_sensitivity: f32,
    pub show_crosshair: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            joystick_size: 140.0,
            button_size: 64.0,
            aim_sensitivity: 5.0,
            show_crosshair: true,
        }
    }
}

impl ControllerSettings {
    /// Clamp sensitivity into range; non-finite values revert to the default
    pub fn sanitized(mut self) -> Self {
        if !self.aim_sensitivity.is_finite() {
            self.aim_sensitivity = Self::default().aim_sensitivity;
        }
        self.aim_sensitivity = self.aim_sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
        self
    }
}

/// Key-value store for `ControllerSettings`
pub struct SettingsStore {
    db: sled::Db,
}

impl SettingsStore {
    /// Open (or create) the settings database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)
            .with_context(|| format!("Failed to open settings store: {}", path.display()))?;
        Ok(Self::new(db))
    }

    pub fn new(db: sled::Db) -> Self {
        Self { db }
    }

    /// Load settings, falling back to defaults on any problem
    pub fn load(&self) -> ControllerSettings {
        match self.db.get(SETTINGS_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<ControllerSettings>(&bytes) {
                Ok(settings) => {
                    debug!("Loaded controller settings: {:?}", settings);
                    settings.sanitized()
                }
                Err(e) => {
                    warn!("Stored controller settings are corrupt, using defaults: {}", e);
                    ControllerSettings::default()
                }
            },
            Ok(None) => {
                info!("No stored controller settings, using defaults");
                ControllerSettings::default()
            }
            Err(e) => {
                warn!("Failed to read controller settings, using defaults: {}", e);
                ControllerSettings::default()
            }
        }
    }

    /// Persist settings immediately
    pub fn save(&self, settings: &ControllerSettings) -> Result<()> {
        let value = serde_json::to_vec(settings).context("Failed to serialize controller settings")?;

        self.db
            .insert(SETTINGS_KEY, value)
            .context("Failed to persist controller settings to sled")?;
        self.db
            .flush()
            .context("Failed to flush controller settings")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_settings_use_defaults() {
        let temp = tempdir().unwrap();
        let store = SettingsStore::open(temp.path().join("settings.sled")).unwrap();
        assert_eq!(store.load(), ControllerSettings::default());
    }

    #[test]
    fn test_settings_persist_across_restarts() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.sled");

        let custom = ControllerSettings {
            joystick_size: 180.0,
            button_size: 50.0,
            aim_sensitivity: 7.5,
            show_crosshair: false,
        };

        {
            let store = SettingsStore::open(&path).unwrap();
            store.save(&custom).unwrap();
        }

        {
            let store = SettingsStore::open(&path).unwrap();
            assert_eq!(store.load(), custom);
        }
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let temp = tempdir().unwrap();
        let db = sled::open(temp.path().join("settings.sled")).unwrap();
        db.insert(SETTINGS_KEY, &b"{not json"[..]).unwrap();

        let store = SettingsStore::new(db);
        assert_eq!(store.load(), ControllerSettings::default());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let settings: ControllerSettings =
            serde_json::from_str(r#"{"showCrosshair": false}"#).unwrap();
        assert!(!settings.show_crosshair);
        assert_eq!(settings.aim_sensitivity, 5.0);
    }

    #[test]
    fn test_sensitivity_is_clamped() {
        let settings = ControllerSettings {
            aim_sensitivity: 40.0,
            ..ControllerSettings::default()
        }
        .sanitized();
        assert_eq!(settings.aim_sensitivity, MAX_SENSITIVITY);

        let settings = ControllerSettings {
            aim_sensitivity: f32::NAN,
            ..ControllerSettings::default()
        }
        .sanitized();
        assert_eq!(settings.aim_sensitivity, 5.0);
    }
}
