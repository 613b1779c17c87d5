// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! Stored as JSON under the platform config directory. A missing or
//! unreadable file falls back to defaults; the scanner never fails to
//! start because of configuration.

use crate::backend::{CameraFormat, types::Framerate};
use crate::constants::{capture, detector, photo};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Capture format settings
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct FormatSettings {
    /// Resolution width
    pub width: u32,
    /// Resolution height
    pub height: u32,
    /// Framerate
    pub framerate: u32,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            width: capture::DEFAULT_WIDTH,
            height: capture::DEFAULT_HEIGHT,
            framerate: capture::DEFAULT_FRAMERATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Preferred camera device path; None uses the platform default
    pub device_path: Option<String>,
    /// Capture format for the scan session
    pub capture: FormatSettings,
    /// Maximum dimension for QR detection (frames are downscaled to this)
    pub detector_max_dimension: u32,
    /// Override for the photo save directory
    pub save_directory: Option<PathBuf>,
    /// JPEG quality for saved captures (0-100)
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_path: None,
            capture: FormatSettings::default(),
            detector_max_dimension: detector::MAX_DIMENSION,
            save_directory: None,
            jpeg_quality: photo::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Path of the config file under the platform config directory
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qrsnap").join("config.json"))
    }

    /// Load the configuration, falling back to defaults on any error
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            warn!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
        }
    }

    /// Persist the configuration
    pub fn save(&self) -> AppResult<()> {
        let path = Self::path().ok_or_else(|| {
            AppError::Config("No config directory available".to_string())
        })?;
        self.save_to(&path)
    }

    /// Persist to an explicit path
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The capture format these settings describe
    pub fn capture_format(&self) -> CameraFormat {
        CameraFormat {
            width: self.capture.width,
            height: self.capture.height,
            framerate: Framerate::from_int(self.capture.framerate),
        }
    }
}
