// SPDX-License-Identifier: GPL-3.0-only

//! Frame source abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← Owns exactly one source, opens/closes it
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource Trait  │  ← open / read / close
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌────────┐
//!   │ V4L2 │  │ Replay │
//!   └──────┘  └────────┘
//! ```

pub mod file_source;
pub mod format_converters;
pub mod types;
pub mod v4l2;

pub use file_source::ReplaySource;
pub use types::*;
pub use v4l2::{V4l2FrameSource, enumerate_cameras};

use crate::errors::CameraError;

/// A camera-like producer of frames
///
/// A source is owned by a single session. The owner must call `close()`
/// once for every successful `open()`; implementations also close on drop.
pub trait FrameSource: Send {
    /// Acquire the device and start streaming
    ///
    /// Fails with `CameraError::DeviceUnavailable` if the device cannot be
    /// acquired. Opening an already open source is a no-op.
    fn open(&mut self) -> Result<(), CameraError>;

    /// Read the next frame
    ///
    /// May block for up to the driver's timeout. Fails with
    /// `CameraError::ReadFailed` on a transient fault or when not open.
    fn read(&mut self) -> Result<Frame, CameraError>;

    /// Release the device
    ///
    /// Idempotent: safe on a closed or never-opened source.
    fn close(&mut self);

    /// Whether the device is currently held
    fn is_open(&self) -> bool;

    /// Name for logging and status display
    fn name(&self) -> String;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn open(&mut self) -> Result<(), CameraError> {
        (**self).open()
    }

    fn read(&mut self) -> Result<Frame, CameraError> {
        (**self).read()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}
