// SPDX-License-Identifier: GPL-3.0-only

//! Parcel Camera - a barcode-triggered shipment recording station
//!
//! The operator starts a scan, the camera feed is searched for a shipping
//! label barcode, and the decoded tracking number is bundled together with
//! the packing recording into `<tracking_number>.zip`.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture session state machine, detector, preview and worker
//! - [`backends`]: Frame source abstraction (V4L2 camera, image replay)
//! - [`pipelines`]: Order archive pipeline
//! - [`config`]: User configuration handling
//! - [`storage`]: Archive directory and order listing
//! - [`location`]: Location label attached to orders
//! - [`terminal`]: Terminal scanning station
//!
//! # Example
//!
//! ```ignore
//! // Typically run via:
//! // parcel-camera scan
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod location;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureSession, SessionController, SessionEvent, SessionState, TickOutcome};
pub use backends::camera::{Frame, FrameSource, PixelFormat};
pub use config::Config;
pub use errors::{AppError, AppResult, ArchiveError, CameraError};
pub use pipelines::archive::{ArchiveBuilder, ArchiveOptions, ArchiveReceipt, Order};
