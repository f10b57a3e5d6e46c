// SPDX-License-Identifier: GPL-3.0-only

//! Camera preview module
//!
//! Converts captured frames into packed RGBA buffers the presentation
//! layer can draw directly.

use crate::backends::camera::format_converters::mirror_rgba_horizontally;
use crate::backends::camera::types::Frame;
use std::sync::Arc;

/// A displayable image: tightly packed RGBA, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

impl DisplayBuffer {
    /// RGB of the pixel at (x, y), clamped to the image bounds
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        match self.rgba.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

/// Turns frames into display buffers
///
/// Pure format conversion: the input frame is neither modified nor kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameRenderer {
    /// Mirror the preview left-to-right
    mirror: bool,
}

impl FrameRenderer {
    pub fn new(mirror: bool) -> Self {
        Self { mirror }
    }

    pub fn to_display_buffer(&self, frame: &Frame) -> DisplayBuffer {
        let mut rgba = frame.to_rgba();
        if self.mirror {
            mirror_rgba_horizontally(&mut rgba, frame.width);
        }

        DisplayBuffer {
            width: frame.width,
            height: frame.height,
            rgba: Arc::from(rgba),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    #[test]
    fn test_padded_rgb_frame_becomes_packed_rgba() {
        // 1x2 RGB24 frame with one padding byte per row
        let data = vec![10u8, 20, 30, 0, 40, 50, 60, 0];
        let frame = Frame::new(1, 2, 4, PixelFormat::Rgb24, data).unwrap();

        let buffer = FrameRenderer::default().to_display_buffer(&frame);
        assert_eq!(&buffer.rgba[..], &[10, 20, 30, 255, 40, 50, 60, 255]);
        assert_eq!(buffer.pixel(0, 1), (40, 50, 60));
    }

    #[test]
    fn test_mirror_leaves_frame_untouched() {
        let frame = Frame::from_gray(2, 1, vec![0, 255]).unwrap();
        let buffer = FrameRenderer::new(true).to_display_buffer(&frame);

        assert_eq!(buffer.pixel(0, 0), (255, 255, 255));
        assert_eq!(&frame.data[..], &[0, 255]);
    }
}
