// SPDX-License-Identifier: GPL-3.0-only

//! Ordered composition of detectors

use super::{BarcodeDetector, LinearBarcodeDetector, QrBarcodeDetector};
use crate::app::frame_processor::types::ScanResult;
use crate::backends::camera::types::Frame;
use crate::constants::capture::DEFAULT_DETECTOR_MAX_DIMENSION;

/// Runs several detectors on the same frame
///
/// Results are concatenated in chain order, then in each detector's own
/// detection order, so the first-payload rule prefers earlier detectors.
pub struct DetectorChain {
    detectors: Vec<Box<dyn BarcodeDetector>>,
}

impl Default for DetectorChain {
    fn default() -> Self {
        Self::shipping_labels(DEFAULT_DETECTOR_MAX_DIMENSION)
    }
}

impl DetectorChain {
    pub fn new(detectors: Vec<Box<dyn BarcodeDetector>>) -> Self {
        Self { detectors }
    }

    /// QR codes first, then 1D symbologies
    pub fn shipping_labels(max_dimension: u32) -> Self {
        Self::new(vec![
            Box::new(QrBarcodeDetector::with_max_dimension(max_dimension)),
            Box::new(LinearBarcodeDetector::with_max_dimension(max_dimension)),
        ])
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl std::fmt::Debug for DetectorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorChain")
            .field("detectors", &self.detectors.len())
            .finish()
    }
}

impl BarcodeDetector for DetectorChain {
    fn detect(&self, frame: &Frame) -> Vec<ScanResult> {
        self.detectors
            .iter()
            .flat_map(|detector| detector.detect(frame))
            .collect()
    }
}
