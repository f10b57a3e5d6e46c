// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Location label recorded when no location is known
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Timestamp layout used in order metadata (`YYYY-MM-DD HH:MM:SS`)
pub const ORDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Capture loop timing
pub mod timing {
    use super::Duration;

    /// Default tick rate of the capture loop (ticks per second)
    pub const DEFAULT_TICK_RATE: u32 = 30;

    /// Consecutive failed reads tolerated before the device is released
    /// (about one second at the default tick rate)
    pub const DEFAULT_MAX_READ_FAILURES: u32 = 30;

    /// Upper bound on a single archive write
    pub const DEFAULT_ARCHIVE_TIMEOUT_SECS: u64 = 30;

    /// How long the idle controller waits for a command before re-checking
    pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

    /// Tick interval for a given rate, clamped to at least one tick per second
    pub fn tick_interval(tick_rate: u32) -> Duration {
        Duration::from_secs(1) / tick_rate.max(1)
    }
}

/// Camera capture defaults
pub mod capture {
    /// Preferred capture width; barcodes decode fine at VGA
    pub const DEFAULT_WIDTH: u32 = 640;

    /// Preferred capture height
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Number of memory-mapped buffers for V4L2 streaming
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Frames are downscaled to this size before barcode detection
    pub const DEFAULT_DETECTOR_MAX_DIMENSION: u32 = 640;
}

/// Archive layout
pub mod archive {
    /// Extension of the expected recording
    pub const MEDIA_EXTENSION: &str = "mp4";

    /// Extension of the transient metadata file
    pub const METADATA_EXTENSION: &str = "json";

    /// Extension of the durable archive bundle
    pub const ARCHIVE_EXTENSION: &str = "zip";

    /// Suffix of in-progress archive files (hidden, renamed on success)
    pub const PARTIAL_SUFFIX: &str = "part";

    /// Longest accepted tracking number
    pub const MAX_TRACKING_NUMBER_LEN: usize = 128;

    /// Indentation used for metadata JSON
    pub const METADATA_INDENT: &[u8] = b"    ";
}

/// Supported file formats
pub mod file_formats {
    /// Image file extensions the replay source accepts
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application metadata
pub mod app_info {
    /// Application name used for config and log directories
    pub const APP_NAME: &str = "parcel-camera";

    /// Config file name inside the config directory
    pub const CONFIG_FILE: &str = "config.json";

    /// Version string, including git describe output when available
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
