//! Application data locations.
//!
//! - **Portable mode**: a `.portable` marker next to the executable keeps all
//!   data in that directory.
//! - **Installed mode** (default): data lives under the platform data dir
//!   (`%APPDATA%\Touchpad GW`, `~/.local/share/Touchpad GW`, ...).

use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "Touchpad GW";

/// Resolved data directories
#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    /// Root of all persisted state
    pub data_dir: PathBuf,
    /// Whether running in portable mode (data next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::resolve(&exe_dir, dirs::data_dir())
    }

    fn resolve(exe_dir: &Path, platform_data_dir: Option<PathBuf>) -> Self {
        if exe_dir.join(".portable").exists() {
            debug!("Running in portable mode (.portable marker found)");
            return Self {
                data_dir: exe_dir.join(".state"),
                is_portable: true,
            };
        }

        let data_dir = platform_data_dir
            .unwrap_or_else(|| exe_dir.to_path_buf())
            .join(APP_NAME);

        debug!("Running in installed mode (data dir: {})", data_dir.display());
        Self {
            data_dir,
            is_portable: false,
        }
    }

    /// Location of the sled settings database
    pub fn settings_db_path(&self) -> PathBuf {
        self.data_dir.join("settings")
    }

    /// Create the data directory if needed
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if !self.data_dir.exists() {
            debug!("Creating data directory: {}", self.data_dir.display());
            std::fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }
}
