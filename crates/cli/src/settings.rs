use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use pitchplay_core::shared::constants::{
    APP_DIR_NAME, DEFAULT_OUTPUT_DEVICE, DEFAULT_RECORDING_FILENAME, SETTINGS_FILENAME,
};

/// Where to play and where to record. Effect presets are fixed and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Substring of the output device to route playback to.
    pub output_device: String,
    pub recording_path: PathBuf,
}

fn default_recording_path() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_RECORDING_FILENAME)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_device: DEFAULT_OUTPUT_DEVICE.to_string(),
            recording_path: default_recording_path(),
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(SETTINGS_FILENAME))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Missing or malformed files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Could not save settings to {}: {}", path.display(), e);
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

}
