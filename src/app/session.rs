// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state machine
//!
//! ```text
//!            start()                 barcode decoded
//!   ┌──────┐ ───────▶ ┌──────────┐ ───────────────▶ ┌────────────┐
//!   │ Idle │          │ Scanning │                  │ Finalizing │
//!   └──────┘ ◀─────── └──────────┘                  └────────────┘
//!      ▲      stop() / too many failed reads               │
//!      └───────────────────────────────────────────────────┘
//!                     archive built (or failed)
//! ```
//!
//! The frame source is open exactly while the session is `Scanning`. All
//! methods take `&mut self`, so a transition can never interleave with a tick.

use crate::app::camera_preview::{DisplayBuffer, FrameRenderer};
use crate::app::frame_processor::{BarcodeDetector, first_payload};
use crate::backends::camera::FrameSource;
use crate::config::{Config, FrameOrientation};
use crate::constants::timing::DEFAULT_MAX_READ_FAILURES;
use crate::errors::{ArchiveError, CameraError};
use crate::location::{FixedLocation, LocationProvider};
use crate::pipelines::archive::{ArchiveBuilder, ArchiveReceipt, TrackingNumber};
use tracing::{debug, error, info, trace, warn};

/// Log a tick summary every N ticks
const TICK_LOG_INTERVAL: u64 = 30;

/// Lifecycle state of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Camera released, waiting for a start command
    Idle,
    /// Camera open, frames are read and searched every tick
    Scanning,
    /// Barcode found, the order archive is being written
    Finalizing,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Scanning => write!(f, "Scanning"),
            SessionState::Finalizing => write!(f, "Finalizing"),
        }
    }
}

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Correction applied to each frame before detection and preview
    pub orientation: FrameOrientation,
    /// Back-to-back failed reads tolerated before the camera is released
    pub max_consecutive_read_failures: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            orientation: FrameOrientation::default(),
            max_consecutive_read_failures: DEFAULT_MAX_READ_FAILURES,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            orientation: config.orientation,
            max_consecutive_read_failures: config.max_consecutive_read_failures,
        }
    }
}

/// Called with `(from, to)` after each transition and its side effects
pub type TransitionHook = Box<dyn FnMut(SessionState, SessionState) + Send>;

/// What a single tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// The session was not scanning; nothing happened
    Inactive,
    /// The frame read failed and was tolerated
    ReadSkipped {
        /// Failed reads in a row so far
        consecutive: u32,
    },
    /// A frame was shown, no barcode was found
    Preview(DisplayBuffer),
    /// A barcode was found and the session finalized the order
    Finalized {
        /// Sanitized tracking number (raw payload if it could not be used)
        tracking_number: String,
        /// Preview of the frame the barcode was found in
        preview: DisplayBuffer,
        /// Outcome of the archive step
        result: Result<ArchiveReceipt, ArchiveError>,
    },
    /// Reads kept failing; the camera was released and the session is idle
    Aborted(CameraError),
}

/// Orchestrates frame source, detector, renderer and archive builder
pub struct CaptureSession {
    state: SessionState,
    source: Box<dyn FrameSource>,
    detector: Box<dyn BarcodeDetector>,
    renderer: FrameRenderer,
    archiver: ArchiveBuilder,
    location: Box<dyn LocationProvider>,
    options: SessionOptions,
    consecutive_failures: u32,
    ticks: u64,
    transition_hook: Option<TransitionHook>,
}

impl CaptureSession {
    pub fn new(
        source: impl FrameSource + 'static,
        detector: impl BarcodeDetector + 'static,
        renderer: FrameRenderer,
        archiver: ArchiveBuilder,
        options: SessionOptions,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            source: Box::new(source),
            detector: Box::new(detector),
            renderer,
            archiver,
            location: Box::new(FixedLocation::default()),
            options,
            consecutive_failures: 0,
            ticks: 0,
            transition_hook: None,
        }
    }

    /// Use `location` for the location label of new orders
    pub fn with_location(mut self, location: impl LocationProvider + 'static) -> Self {
        self.location = Box::new(location);
        self
    }

    pub fn set_transition_hook(&mut self, hook: TransitionHook) {
        self.transition_hook = Some(hook);
    }

    pub fn take_transition_hook(&mut self) -> Option<TransitionHook> {
        self.transition_hook.take()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == SessionState::Scanning
    }

    /// Whether the frame source currently holds the device
    pub fn is_source_open(&self) -> bool {
        self.source.is_open()
    }

    pub fn archiver(&self) -> &ArchiveBuilder {
        &self.archiver
    }

    /// Open the camera and begin scanning
    ///
    /// Starting an already scanning session does nothing. If the camera
    /// cannot be opened the session stays `Idle`.
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.state != SessionState::Idle {
            debug!(state = %self.state, "Start ignored, session already active");
            return Ok(());
        }

        if let Err(e) = self.source.open() {
            warn!(source = %self.source.name(), error = %e, "Failed to open frame source");
            return Err(e);
        }

        info!(source = %self.source.name(), "Scanning started");
        self.consecutive_failures = 0;
        self.ticks = 0;
        self.transition(SessionState::Scanning);
        Ok(())
    }

    /// Run one capture iteration: read, render, detect, maybe finalize
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::Scanning {
            return TickOutcome::Inactive;
        }
        self.ticks += 1;

        let raw = match self.source.read() {
            Ok(frame) => frame,
            Err(e) => return self.read_failed(e),
        };
        self.consecutive_failures = 0;

        let frame = match self.options.orientation {
            FrameOrientation::Normal => raw,
            FrameOrientation::FlipVertical => raw.flipped_vertically(),
        };

        let preview = self.renderer.to_display_buffer(&frame);
        let scan = first_payload(self.detector.detect(&frame));
        drop(frame);

        if self.ticks % TICK_LOG_INTERVAL == 0 {
            trace!(ticks = self.ticks, "Scanning");
        }

        match scan {
            Some(scan) => self.finalize(scan.payload, preview),
            None => TickOutcome::Preview(preview),
        }
    }

    /// Operator-confirmed stop without a detection
    ///
    /// Returns whether a scan was actually stopped. No archive is produced.
    pub fn stop(&mut self) -> bool {
        if self.state != SessionState::Scanning {
            debug!(state = %self.state, "Stop ignored, not scanning");
            return false;
        }

        self.source.close();
        info!("Scanning stopped by operator");
        self.transition(SessionState::Idle);
        true
    }

    /// Release the camera from any state
    pub fn shutdown(&mut self) {
        self.source.close();
        if self.state != SessionState::Idle {
            self.transition(SessionState::Idle);
        }
        debug!("Capture session shut down");
    }

    fn read_failed(&mut self, e: CameraError) -> TickOutcome {
        self.consecutive_failures += 1;
        let consecutive = self.consecutive_failures;

        if consecutive >= self.options.max_consecutive_read_failures.max(1) {
            error!(consecutive, error = %e, "Frame reads keep failing, releasing camera");
            self.source.close();
            self.transition(SessionState::Idle);
            return TickOutcome::Aborted(CameraError::ReadFailuresExceeded { consecutive });
        }

        debug!(consecutive, error = %e, "Frame read failed, skipping tick");
        TickOutcome::ReadSkipped { consecutive }
    }

    fn finalize(&mut self, payload: String, preview: DisplayBuffer) -> TickOutcome {
        self.source.close();
        self.transition(SessionState::Finalizing);

        let tracking_number = TrackingNumber::parse(&payload)
            .map(|tn| tn.to_string())
            .unwrap_or_else(|_| payload.clone());
        info!(tracking_number = %tracking_number, ticks = self.ticks, "Barcode detected");

        let location = self.location.label_or_unknown();
        let result = self
            .archiver
            .order_for(&payload, &location)
            .and_then(|order| self.archiver.build(&order));

        match &result {
            Ok(receipt) => info!(
                tracking_number = %receipt.tracking_number,
                path = %receipt.archive_path.display(),
                "Order archived"
            ),
            Err(e) => error!(tracking_number = %tracking_number, error = %e, "Order archive failed"),
        }

        self.transition(SessionState::Idle);

        TickOutcome::Finalized {
            tracking_number,
            preview,
            result,
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        self.state = to;
        debug!(%from, %to, "Session state changed");
        if let Some(hook) = self.transition_hook.as_mut() {
            hook(from, to);
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.source.close();
    }
}
