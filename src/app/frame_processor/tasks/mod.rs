// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! This module contains the detector abstraction and its implementations.
//! Shipping labels carry either a QR symbol or a 1D code (Code128, EAN, ...),
//! so stations run a [`DetectorChain`] of both decoders.

pub mod chain;
pub mod linear_detector;
pub mod qr_detector;

pub use chain::DetectorChain;
pub use linear_detector::LinearBarcodeDetector;
pub use qr_detector::QrBarcodeDetector;

use super::types::ScanResult;
use crate::backends::camera::format_converters::downscale_luma;
use crate::backends::camera::types::Frame;

/// Finds barcodes in a single frame
///
/// Implementations must be pure functions of the frame's pixel data and
/// return results in detection order.
pub trait BarcodeDetector: Send {
    /// Decode every barcode found in `frame`; empty when there is none
    fn detect(&self, frame: &Frame) -> Vec<ScanResult>;
}

impl<T: BarcodeDetector + ?Sized> BarcodeDetector for Box<T> {
    fn detect(&self, frame: &Frame) -> Vec<ScanResult> {
        (**self).detect(frame)
    }
}

/// Luma plane of the frame, downscaled to fit within `max_dimension`
pub(crate) fn prepare_luma(frame: &Frame, max_dimension: u32) -> (Vec<u8>, u32, u32) {
    let width = frame.width;
    let height = frame.height;
    let luma = frame.to_luma();

    if width <= max_dimension && height <= max_dimension {
        return (luma, width, height);
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);

    (
        downscale_luma(&luma, width, height, new_width, new_height),
        new_width,
        new_height,
    )
}
