// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 webcam frame source
//!
//! Captures directly from `/dev/video<N>` with the v4l crate using a
//! memory-mapped stream. YUYV is preferred since barcode detection only
//! needs the luma plane; MJPG is the fallback and is decoded on the CPU.

use super::FrameSource;
use super::types::{CameraDevice, Frame, PixelFormat};
use crate::constants::capture::V4L2_BUFFER_COUNT;
use crate::errors::CameraError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Upper bound for a single blocking dequeue
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Set while any V4L2 source in this process holds a device.
/// The station has one camera, so only one handle may be open at a time.
static DEVICE_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Wire format negotiated with the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireFormat {
    Yuyv,
    Mjpg,
}

/// An open device together with its running stream
struct OpenDevice {
    // Field order matters: the stream must stop before the device closes
    stream: MmapStream<'static>,
    _device: Device,
    width: u32,
    height: u32,
    stride: u32,
    wire_format: WireFormat,
}

/// Frame source backed by a V4L2 capture device
pub struct V4l2FrameSource {
    index: usize,
    width: u32,
    height: u32,
    open: Option<OpenDevice>,
}

impl V4l2FrameSource {
    /// Create a source for `/dev/video<index>` requesting the given resolution
    ///
    /// Nothing is opened until `open()`.
    pub fn new(index: usize, width: u32, height: u32) -> Self {
        Self {
            index,
            width,
            height,
            open: None,
        }
    }

    fn open_device(&self) -> Result<OpenDevice, CameraError> {
        let device = Device::new(self.index).map_err(|e| {
            CameraError::DeviceUnavailable(format!("/dev/video{}: {}", self.index, e))
        })?;

        let (format, wire_format) = self.negotiate_format(&device)?;

        info!(
            device = self.index,
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "Negotiated capture format"
        );

        let mut stream = MmapStream::with_buffers(&device, Type::VideoCapture, V4L2_BUFFER_COUNT)
            .map_err(|e| {
                CameraError::DeviceUnavailable(format!("failed to start stream: {}", e))
            })?;
        stream.set_timeout(READ_TIMEOUT);

        Ok(OpenDevice {
            stream,
            _device: device,
            width: format.width,
            height: format.height,
            stride: format.stride,
            wire_format,
        })
    }

    fn negotiate_format(&self, device: &Device) -> Result<(v4l::Format, WireFormat), CameraError> {
        let mut format = device
            .format()
            .map_err(|e| CameraError::DeviceUnavailable(format!("failed to query format: {}", e)))?;

        for (fourcc, wire_format) in [
            (FourCC::new(b"YUYV"), WireFormat::Yuyv),
            (FourCC::new(b"MJPG"), WireFormat::Mjpg),
        ] {
            format.width = self.width;
            format.height = self.height;
            format.fourcc = fourcc;

            match device.set_format(&format) {
                Ok(applied) if applied.fourcc == fourcc => return Ok((applied, wire_format)),
                Ok(applied) => {
                    debug!(requested = %fourcc, got = %applied.fourcc, "Driver substituted format");
                }
                Err(e) => {
                    debug!(requested = %fourcc, error = %e, "Driver rejected format");
                }
            }
        }

        Err(CameraError::DeviceUnavailable(format!(
            "/dev/video{} supports neither YUYV nor MJPG",
            self.index
        )))
    }
}

impl FrameSource for V4l2FrameSource {
    fn open(&mut self) -> Result<(), CameraError> {
        if self.open.is_some() {
            return Ok(());
        }

        if DEVICE_CLAIMED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CameraError::DeviceUnavailable(
                "another capture session already holds the camera".to_string(),
            ));
        }

        match self.open_device() {
            Ok(device) => {
                info!(device = self.index, "Camera opened");
                self.open = Some(device);
                Ok(())
            }
            Err(e) => {
                DEVICE_CLAIMED.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn read(&mut self) -> Result<Frame, CameraError> {
        let device = self
            .open
            .as_mut()
            .ok_or_else(|| CameraError::ReadFailed("camera is not open".to_string()))?;

        let (buf, meta) = device
            .stream
            .next()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;

        if buf.is_empty() || meta.bytesused == 0 {
            return Err(CameraError::ReadFailed("driver returned an empty buffer".to_string()));
        }
        let used = &buf[..(meta.bytesused as usize).min(buf.len())];

        match device.wire_format {
            WireFormat::Yuyv => Frame::new(
                device.width,
                device.height,
                device.stride,
                PixelFormat::Yuyv,
                used.to_vec(),
            ),
            WireFormat::Mjpg => {
                let img = image::load_from_memory_with_format(used, image::ImageFormat::Jpeg)
                    .map_err(|e| CameraError::ReadFailed(format!("MJPG decode: {}", e)))?;
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                Frame::from_rgba(width, height, rgba.into_raw())
            }
        }
    }

    fn close(&mut self) {
        if let Some(device) = self.open.take() {
            drop(device);
            DEVICE_CLAIMED.store(false, Ordering::SeqCst);
            info!(device = self.index, "Camera closed");
        }
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn name(&self) -> String {
        format!("/dev/video{}", self.index)
    }
}

impl Drop for V4l2FrameSource {
    fn drop(&mut self) {
        if self.open.is_some() {
            warn!(device = self.index, "Camera dropped while open, closing");
            self.close();
        }
    }
}

/// List V4L2 devices that can capture video
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut cameras: Vec<CameraDevice> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let index = node.index();
            let device = Device::new(index).ok()?;
            let caps = device.query_caps().ok()?;
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                return None;
            }

            Some(CameraDevice {
                index,
                name: node.name().unwrap_or_else(|| caps.card.clone()),
                path: node.path().to_string_lossy().to_string(),
            })
        })
        .collect();

    cameras.sort_by_key(|c| c.index);
    debug!(count = cameras.len(), "Enumerated V4L2 cameras");
    cameras
}
