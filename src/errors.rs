// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanning station
//!
//! Every error here is meant to end up in front of the operator as a notice.
//! None of them is fatal to the process.

use std::fmt;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Archive assembly errors
    Archive(ArchiveError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The device could not be opened (missing, busy, or already claimed)
    DeviceUnavailable(String),
    /// A single frame could not be read; tolerated per tick
    ReadFailed(String),
    /// Reads kept failing until the session gave up on the device
    ReadFailuresExceeded {
        /// Number of back-to-back failed reads
        consecutive: u32,
    },
}

/// Archive assembly errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// No recording exists for the tracking number
    MissingMedia(PathBuf),
    /// Disk or packaging failure (including timeouts)
    WriteFailed(String),
    /// An archive for this tracking number already exists and the policy rejects it
    DuplicateTrackingNumber(String),
    /// The decoded payload cannot be used as a file name
    InvalidTrackingNumber(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Archive(e) => write!(f, "Archive error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CameraError::ReadFailed(msg) => write!(f, "Frame read failed: {}", msg),
            CameraError::ReadFailuresExceeded { consecutive } => {
                write!(f, "Camera stopped responding after {} failed reads", consecutive)
            }
        }
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::MissingMedia(path) => {
                write!(f, "No recording found at {}", path.display())
            }
            ArchiveError::WriteFailed(msg) => write!(f, "Failed to write archive: {}", msg),
            ArchiveError::DuplicateTrackingNumber(tn) => {
                write!(f, "An archive for {} already exists", tn)
            }
            ArchiveError::InvalidTrackingNumber(raw) => {
                write!(f, "Unusable tracking number {:?}", raw)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for ArchiveError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        AppError::Archive(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::WriteFailed(err.to_string())
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::WriteFailed(err.to_string())
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveError::WriteFailed(format!("metadata serialization: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_media_mentions_path() {
        let err = ArchiveError::MissingMedia(PathBuf::from("/tmp/SP1.mp4"));
        assert!(err.to_string().contains("/tmp/SP1.mp4"));
    }

    #[test]
    fn test_io_error_becomes_write_failed() {
        let io = std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full");
        let err: ArchiveError = io.into();
        assert!(matches!(err, ArchiveError::WriteFailed(msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_sub_errors_wrap_into_app_error() {
        let app: AppError = CameraError::DeviceUnavailable("busy".into()).into();
        assert_eq!(app.to_string(), "Camera error: Camera unavailable: busy");
    }
}
