// SPDX-License-Identifier: GPL-3.0-only

//! Scanning station application logic
//!
//! # Architecture
//!
//! - `frame_processor`: Barcode detection on captured frames
//! - `camera_preview`: Frame to display buffer conversion
//! - `session`: Capture session state machine (Idle, Scanning, Finalizing)
//! - `controller`: Worker thread driving the session from operator commands
//!
//! # Main Types
//!
//! - `CaptureSession`: Owns the camera, detector and archive builder
//! - `SessionController`: Handle used by the presentation layer
//! - `SessionEvent`: Everything the presentation layer is told about

pub mod camera_preview;
pub mod controller;
pub mod frame_processor;
pub mod session;

pub use camera_preview::{DisplayBuffer, FrameRenderer};
pub use controller::{Command, SessionController, SessionEvent};
pub use frame_processor::{
    BarcodeDetector, DetectorChain, LinearBarcodeDetector, QrBarcodeDetector, ScanResult,
};
pub use session::{CaptureSession, SessionOptions, SessionState, TickOutcome};

use crate::backends::camera::{FrameSource, ReplaySource, V4l2FrameSource};
use crate::config::Config;
use crate::errors::AppResult;
use crate::location::FixedLocation;
use crate::pipelines::archive::{ArchiveBuilder, ArchiveOptions};
use crate::storage;
use std::path::PathBuf;
use tracing::info;

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// V4L2 capture device by index
    Camera(usize),
    /// Image files in a directory, replayed in name order
    Replay(PathBuf),
}

impl SourceSelection {
    /// Build the frame source without opening it
    pub fn create(&self, config: &Config) -> AppResult<Box<dyn FrameSource>> {
        match self {
            SourceSelection::Camera(index) => Ok(Box::new(V4l2FrameSource::new(
                *index,
                config.capture_width,
                config.capture_height,
            ))),
            SourceSelection::Replay(dir) => Ok(Box::new(ReplaySource::from_directory(dir)?)),
        }
    }
}

/// Assemble a session for `source` from the effective configuration
pub fn build_session(config: &Config, source: Box<dyn FrameSource>) -> CaptureSession {
    let archive_dir = storage::archive_directory(config);
    info!(
        source = %source.name(),
        archive_dir = %archive_dir.display(),
        "Building capture session"
    );

    CaptureSession::new(
        source,
        DetectorChain::shipping_labels(config.detector_max_dimension),
        FrameRenderer::new(config.mirror_preview),
        ArchiveBuilder::new(archive_dir, ArchiveOptions::from_config(config)),
        SessionOptions::from_config(config),
    )
    .with_location(FixedLocation::new(config.location_label.clone()))
}

/// Build the session and start its worker thread
pub fn spawn_station(config: &Config, selection: &SourceSelection) -> AppResult<SessionController> {
    let source = selection.create(config)?;
    SessionController::spawn(build_session(config, source), config.tick_rate)
}
