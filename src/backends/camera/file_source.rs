// SPDX-License-Identifier: GPL-3.0-only

//! Replay frame source
//!
//! A virtual camera that plays back still frames, either loaded from a
//! directory of image files or handed over in memory. Playback loops, like a
//! camera that keeps pointing at the same scene.

use super::FrameSource;
use super::types::Frame;
use crate::constants::file_formats;
use crate::errors::CameraError;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Frame source that replays a fixed list of frames
#[derive(Debug)]
pub struct ReplaySource {
    label: String,
    frames: Vec<Frame>,
    position: usize,
    open: bool,
    available: bool,
    open_count: u32,
}

impl ReplaySource {
    /// Replay the given frames in order, looping at the end
    pub fn from_frames(label: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            label: label.into(),
            frames,
            position: 0,
            open: false,
            available: true,
            open_count: 0,
        }
    }

    /// Replay every image file in `dir`, ordered by file name
    pub fn from_directory(dir: &Path) -> Result<Self, CameraError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CameraError::DeviceUnavailable(format!("{}: {}", dir.display(), e))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(file_formats::is_image_extension)
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            match load_image_as_frame(path) {
                Ok(frame) => frames.push(frame),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable image"),
            }
        }

        if frames.is_empty() {
            return Err(CameraError::DeviceUnavailable(format!(
                "no images found in {}",
                dir.display()
            )));
        }

        info!(dir = %dir.display(), count = frames.len(), "Loaded replay frames");
        Ok(Self::from_frames(dir.display().to_string(), frames))
    }

    /// A source whose `open()` always fails, like an unplugged camera
    pub fn unavailable(label: impl Into<String>) -> Self {
        Self {
            available: false,
            ..Self::from_frames(label, Vec::new())
        }
    }

    /// How many times the source has been opened successfully
    pub fn open_count(&self) -> u32 {
        self.open_count
    }
}

impl FrameSource for ReplaySource {
    fn open(&mut self) -> Result<(), CameraError> {
        if !self.available || self.frames.is_empty() {
            return Err(CameraError::DeviceUnavailable(format!(
                "{} is not available",
                self.label
            )));
        }
        if !self.open {
            self.open = true;
            self.open_count += 1;
            self.position = 0;
            debug!(source = %self.label, "Replay source opened");
        }
        Ok(())
    }

    fn read(&mut self) -> Result<Frame, CameraError> {
        if !self.open {
            return Err(CameraError::ReadFailed(format!("{} is not open", self.label)));
        }

        let mut frame = self.frames[self.position % self.frames.len()].clone();
        frame.captured_at = Instant::now();
        self.position += 1;
        Ok(frame)
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            debug!(source = %self.label, "Replay source closed");
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> Result<Frame, CameraError> {
    let img = image::open(path).map_err(|e| {
        CameraError::ReadFailed(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Frame::from_rgba(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(value: u8) -> Frame {
        Frame::from_gray(2, 2, vec![value; 4]).unwrap()
    }

    #[test]
    fn test_read_requires_open() {
        let mut source = ReplaySource::from_frames("test", vec![gray(1)]);
        assert!(matches!(source.read(), Err(CameraError::ReadFailed(_))));
    }

    #[test]
    fn test_replay_loops() {
        let mut source = ReplaySource::from_frames("test", vec![gray(1), gray(2)]);
        source.open().unwrap();

        let values: Vec<u8> = (0..3).map(|_| source.read().unwrap().data[0]).collect();
        assert_eq!(values, vec![1, 2, 1]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut source = ReplaySource::from_frames("test", vec![gray(1)]);
        source.close();
        source.open().unwrap();
        source.close();
        source.close();
        assert!(!source.is_open());
        assert_eq!(source.open_count(), 1);
    }

    #[test]
    fn test_unavailable_source_fails_to_open() {
        let mut source = ReplaySource::unavailable("unplugged");
        assert!(matches!(source.open(), Err(CameraError::DeviceUnavailable(_))));
        assert!(!source.is_open());
    }

    #[test]
    fn test_from_directory_loads_images() {
        let dir = tempfile::tempdir().unwrap();
        image::GrayImage::from_pixel(4, 4, image::Luma([200]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ReplaySource::from_directory(dir.path()).unwrap();
        source.open().unwrap();
        let frame = source.read().unwrap();
        assert_eq!((frame.width, frame.height), (4, 4));
    }
}
