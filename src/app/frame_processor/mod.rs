// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module
//!
//! Barcode detection on captured frames. The capture session runs one
//! detection pass per tick and acts on the first payload only.

pub mod tasks;
pub mod types;

pub use tasks::{BarcodeDetector, DetectorChain, LinearBarcodeDetector, QrBarcodeDetector};
pub use types::{ScanResult, first_payload};
