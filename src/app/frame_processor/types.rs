// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results

use crate::backends::camera::types::Frame;

/// A decoded barcode and the frame it was found in
///
/// Produced by a detector and consumed once by the capture session.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Decoded payload text
    pub payload: String,
    /// Frame the payload was decoded from
    pub frame: Frame,
}

impl ScanResult {
    pub fn new(payload: impl Into<String>, frame: Frame) -> Self {
        Self {
            payload: payload.into(),
            frame,
        }
    }
}

/// Pick the payload the session acts on
///
/// Only the first result in detection order counts; later codes in the same
/// frame are dropped. This is not a ranking by size or confidence, so a label
/// carrying several codes may yield whichever one the detector found first.
pub fn first_payload(results: Vec<ScanResult>) -> Option<ScanResult> {
    let total = results.len();
    let mut iter = results.into_iter();
    let first = iter.next();
    if total > 1 {
        tracing::debug!(
            ignored = total - 1,
            "Multiple barcodes in one frame, keeping the first"
        );
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::from_gray(1, 1, vec![0]).unwrap()
    }

    #[test]
    fn test_first_payload_wins() {
        let results = vec![ScanResult::new("A1", frame()), ScanResult::new("B2", frame())];
        assert_eq!(first_payload(results).unwrap().payload, "A1");
    }

    #[test]
    fn test_first_payload_empty() {
        assert!(first_payload(Vec::new()).is_none());
    }
}
