// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{app_info, capture, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Orientation correction applied to every frame before detection and preview
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum FrameOrientation {
    /// Use frames as delivered by the camera
    Normal,
    /// Flip frames top-to-bottom (overhead, inverted camera mounts)
    #[default]
    FlipVertical,
}

/// What to do when an archive for the same tracking number already exists
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum DuplicatePolicy {
    /// Replace the existing archive; the operator is warned
    #[default]
    Overwrite,
    /// Keep the existing archive and fail the new one
    Reject,
}

/// What happens to the original recording once it is inside an archive
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MediaRetention {
    /// Leave the recording next to the archive
    #[default]
    Keep,
    /// Delete the recording after the archive has been published
    Delete,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding recordings and archives (None = the user's videos directory)
    pub archive_dir: Option<PathBuf>,
    /// V4L2 device index (`/dev/video<N>`)
    pub camera_index: usize,
    /// Requested capture width
    pub capture_width: u32,
    /// Requested capture height
    pub capture_height: u32,
    /// Capture loop ticks per second
    pub tick_rate: u32,
    /// Orientation correction for incoming frames
    pub orientation: FrameOrientation,
    /// Mirror the preview horizontally (display only)
    pub mirror_preview: bool,
    /// Back-to-back read failures tolerated before the camera is released
    pub max_consecutive_read_failures: u32,
    /// Upper bound for writing one archive
    pub archive_timeout_secs: u64,
    /// Collision handling for repeated tracking numbers
    pub duplicate_policy: DuplicatePolicy,
    /// Post-archive handling of the original recording
    pub media_retention: MediaRetention,
    /// Fixed location label for this station
    pub location_label: Option<String>,
    /// Frames are downscaled to this size before detection
    pub detector_max_dimension: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_dir: None,
            camera_index: 0,
            capture_width: capture::DEFAULT_WIDTH,
            capture_height: capture::DEFAULT_HEIGHT,
            tick_rate: timing::DEFAULT_TICK_RATE,
            orientation: FrameOrientation::default(),
            mirror_preview: false,
            max_consecutive_read_failures: timing::DEFAULT_MAX_READ_FAILURES,
            archive_timeout_secs: timing::DEFAULT_ARCHIVE_TIMEOUT_SECS,
            duplicate_policy: DuplicatePolicy::default(),
            media_retention: MediaRetention::default(),
            location_label: None,
            detector_max_dimension: capture::DEFAULT_DETECTOR_MAX_DIMENSION,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(app_info::APP_NAME)
            .join(app_info::CONFIG_FILE)
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config file, creating its directory if needed
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, json)?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Archive timeout as a Duration
    pub fn archive_timeout(&self) -> Duration {
        Duration::from_secs(self.archive_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "camera_index": 2, "duplicate_policy": "Reject" }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.tick_rate, timing::DEFAULT_TICK_RATE);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::load(&path), Err(AppError::Config(_))));
    }
}
