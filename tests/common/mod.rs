// SPDX-License-Identifier: GPL-3.0-only

//! Shared fixtures for integration tests
#![allow(dead_code)]

use parcel_camera::backends::camera::{Frame, FrameSource};
use parcel_camera::errors::CameraError;
use barcoders::sym::code128::Code128;
use qrcode::{Color, QrCode};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Pixels per QR module
const MODULE_PX: usize = 6;

/// Quiet zone around the symbol, in modules
const QUIET_ZONE: usize = 4;

/// Grayscale frame showing an upright QR code for `payload`
pub fn qr_frame(payload: &str) -> Frame {
    let code = QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width();
    let colors = code.to_colors();

    let side = (modules + 2 * QUIET_ZONE) * MODULE_PX;
    let mut pixels = vec![255u8; side * side];
    for my in 0..modules {
        for mx in 0..modules {
            if colors[my * modules + mx] != Color::Dark {
                continue;
            }
            let x0 = (mx + QUIET_ZONE) * MODULE_PX;
            let y0 = (my + QUIET_ZONE) * MODULE_PX;
            for y in y0..y0 + MODULE_PX {
                pixels[y * side + x0..y * side + x0 + MODULE_PX].fill(0);
            }
        }
    }

    Frame::from_gray(side as u32, side as u32, pixels).unwrap()
}

/// Pixels per Code128 module
const BAR_PX: usize = 3;

/// Quiet zone either side of the bars, in modules
const BAR_QUIET_ZONE: usize = 10;

/// Height of the bars and of the frame
const BAR_HEIGHT: usize = 80;

/// Grayscale frame showing a Code128 label for `payload` (character set B)
///
/// Bars run top to bottom, so the frame reads the same upside down.
pub fn code128_frame(payload: &str) -> Frame {
    let modules = Code128::new(format!("\u{0181}{}", payload))
        .unwrap()
        .encode();

    let width = (modules.len() + 2 * BAR_QUIET_ZONE) * BAR_PX;
    let mut row = vec![255u8; width];
    for (i, module) in modules.iter().enumerate() {
        if *module == 1 {
            let x0 = (i + BAR_QUIET_ZONE) * BAR_PX;
            row[x0..x0 + BAR_PX].fill(0);
        }
    }

    Frame::from_gray(width as u32, BAR_HEIGHT as u32, row.repeat(BAR_HEIGHT)).unwrap()
}

/// The QR frame as an upside-down camera would deliver it
pub fn inverted_qr_frame(payload: &str) -> Frame {
    qr_frame(payload).flipped_vertically()
}

/// Plain white frame with nothing to detect
pub fn blank_frame() -> Frame {
    Frame::from_gray(96, 72, vec![255; 96 * 72]).unwrap()
}

/// Stand-in for the operator's recording of a package
pub fn write_recording(dir: &Path, tracking_number: &str) {
    std::fs::write(
        dir.join(format!("{}.mp4", tracking_number)),
        b"\x00\x00\x00\x18ftypmp42 fake recording",
    )
    .unwrap();
}

/// Names of all files in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Frame source that plays back a fixed script of reads
///
/// Once the script runs out every read fails. The open flag and counters are
/// shared so tests can observe the source after handing it to a session.
pub struct ScriptedSource {
    script: VecDeque<Result<Frame, CameraError>>,
    open: Arc<AtomicBool>,
    opens: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Frame, CameraError>>) -> Self {
        Self {
            script: script.into(),
            open: Arc::new(AtomicBool::new(false)),
            opens: Arc::new(AtomicU32::new(0)),
            closes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// A script of `n` failed reads
    pub fn failing(n: usize) -> Self {
        Self::new(
            (0..n)
                .map(|i| Err(CameraError::ReadFailed(format!("glitch {}", i))))
                .collect(),
        )
    }

    pub fn open_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.open)
    }

    pub fn opens(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.opens)
    }

    pub fn closes(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.closes)
    }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self) -> Result<(), CameraError> {
        if !self.open.swap(true, Ordering::SeqCst) {
            self.opens.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn read(&mut self) -> Result<Frame, CameraError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(CameraError::ReadFailed("not open".to_string()));
        }
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(CameraError::ReadFailed("script exhausted".to_string())))
    }

    fn close(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
