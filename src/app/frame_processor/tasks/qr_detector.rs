// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements barcode detection using the rqrr crate.
//! Frames are reduced to luma, optionally downscaled, and searched for
//! QR symbols whose payloads are returned in detection order.

use super::{BarcodeDetector, prepare_luma};
use crate::app::frame_processor::types::ScanResult;
use crate::backends::camera::types::Frame;
use crate::constants::capture::DEFAULT_DETECTOR_MAX_DIMENSION;
use tracing::{debug, trace};

/// QR code detector
///
/// Stateless between calls: every result depends only on the frame's pixels.
/// Frames larger than `max_dimension` are downscaled first for speed;
/// shipping labels are large enough to survive it.
#[derive(Debug, Clone)]
pub struct QrBarcodeDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrBarcodeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrBarcodeDetector {
    /// Create a new detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: DEFAULT_DETECTOR_MAX_DIMENSION,
        }
    }

    /// Create a detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl BarcodeDetector for QrBarcodeDetector {
    fn detect(&self, frame: &Frame) -> Vec<ScanResult> {
        let start = std::time::Instant::now();

        let (luma, proc_width, proc_height) = prepare_luma(frame, self.max_dimension);
        trace!(
            proc_width,
            proc_height,
            conversion_ms = start.elapsed().as_millis(),
            "Prepared luma plane for detection"
        );

        let width = proc_width as usize;
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width,
            proc_height as usize,
            |x, y| luma[y * width + x],
        );

        let grids = prepared.detect_grids();
        let mut results = Vec::with_capacity(grids.len());

        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => {
                    debug!(content = %content, "Decoded barcode");
                    results.push(ScanResult::new(content, frame.clone()));
                }
                Err(e) => {
                    debug!(error = ?e, "Failed to decode barcode grid");
                }
            }
        }

        if !results.is_empty() {
            debug!(
                count = results.len(),
                total_ms = start.elapsed().as_millis(),
                "Barcode detection found codes"
            );
        }

        results
    }
}
