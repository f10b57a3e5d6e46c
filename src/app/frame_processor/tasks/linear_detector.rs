// SPDX-License-Identifier: GPL-3.0-only

//! 1D barcode detection task
//!
//! Decodes linear symbologies (Code128, Code39, EAN/UPC, ITF, ...) with the
//! rxing crate. 2D symbols found along the way are dropped; QR codes are
//! left to [`QrBarcodeDetector`](super::QrBarcodeDetector).

use super::{BarcodeDetector, prepare_luma};
use crate::app::frame_processor::types::ScanResult;
use crate::backends::camera::types::Frame;
use crate::constants::capture::DEFAULT_DETECTOR_MAX_DIMENSION;
use rxing::BarcodeFormat;
use tracing::{debug, trace};

/// Linear (1D) barcode detector
///
/// Stateless between calls. Each payload is reported once per frame even
/// if several scan lines cross the same symbol.
#[derive(Debug, Clone)]
pub struct LinearBarcodeDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for LinearBarcodeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearBarcodeDetector {
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

/// Symbologies read by scanning rows of bars
fn is_linear(format: &BarcodeFormat) -> bool {
    matches!(
        format,
        BarcodeFormat::CODABAR
            | BarcodeFormat::CODE_39
            | BarcodeFormat::CODE_93
            | BarcodeFormat::CODE_128
            | BarcodeFormat::EAN_8
            | BarcodeFormat::EAN_13
            | BarcodeFormat::ITF
            | BarcodeFormat::RSS_14
            | BarcodeFormat::RSS_EXPANDED
            | BarcodeFormat::UPC_A
            | BarcodeFormat::UPC_E
    )
}

impl BarcodeDetector for LinearBarcodeDetector {
    fn detect(&self, frame: &Frame) -> Vec<ScanResult> {
        let start = std::time::Instant::now();

        let (luma, proc_width, proc_height) = prepare_luma(frame, self.max_dimension);

        let decoded = match rxing::helpers::detect_multiple_in_luma(luma, proc_width, proc_height) {
            Ok(decoded) => decoded,
            Err(e) => {
                // NotFound on every frame without a label
                trace!(error = ?e, "No linear barcode in frame");
                return Vec::new();
            }
        };

        let mut results: Vec<ScanResult> = Vec::with_capacity(decoded.len());
        for symbol in decoded {
            if !is_linear(symbol.getBarcodeFormat()) {
                trace!(format = ?symbol.getBarcodeFormat(), "Skipping 2D symbol");
                continue;
            }
            let content = symbol.getText();
            if results.iter().any(|r| r.payload == content) {
                continue;
            }
            debug!(content = %content, format = ?symbol.getBarcodeFormat(), "Decoded barcode");
            results.push(ScanResult::new(content.to_string(), frame.clone()));
        }

        if !results.is_empty() {
            debug!(
                count = results.len(),
                total_ms = start.elapsed().as_millis(),
                "Linear barcode detection found codes"
            );
        }

        results
    }
}
