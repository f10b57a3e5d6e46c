// SPDX-License-Identifier: GPL-3.0-only
// Shared types for frame sources

//! Frame and pixel format types shared by all frame sources

use super::format_converters;
use crate::errors::CameraError;
use std::sync::Arc;
use std::time::Instant;

/// Pixel layouts a frame source may deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    Rgba,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    Rgb24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved, 2 bytes per pixel)
    /// Common raw format from webcam sensors
    Yuyv,
}

impl PixelFormat {
    /// Bytes used by one pixel in a row
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Gray8 => 1,
            PixelFormat::Yuyv => 2,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Rgba => "RGBA",
            PixelFormat::Rgb24 => "RGB24",
            PixelFormat::Gray8 => "GRAY8",
            PixelFormat::Yuyv => "YUYV",
        };
        write!(f, "{}", name)
    }
}

/// A single captured image
///
/// Pixel data is reference counted, so cloning a frame does not copy pixels.
/// Rows may carry padding; `stride` is the distance between row starts.
/// Fields are only reachable through accessors so that every frame has
/// passed the buffer checks in [`Frame::new`].
#[derive(Debug, Clone)]
pub struct Frame {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Bytes per row including padding
    pub(crate) stride: u32,
    pub(crate) format: PixelFormat,
    pub(crate) data: Arc<[u8]>,
    /// When the frame left the source
    pub(crate) captured_at: Instant,
}

impl Frame {
    /// Create a frame, checking that the buffer covers every row
    pub fn new(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<Self, CameraError> {
        let data = data.into();

        if width == 0 || height == 0 {
            return Err(CameraError::ReadFailed(format!(
                "empty frame {}x{}",
                width, height
            )));
        }
        if format == PixelFormat::Yuyv && width % 2 != 0 {
            return Err(CameraError::ReadFailed(format!(
                "YUYV frame width {} is not even",
                width
            )));
        }

        let row_bytes = width as usize * format.bytes_per_pixel() as usize;
        if (stride as usize) < row_bytes {
            return Err(CameraError::ReadFailed(format!(
                "stride {} shorter than row ({} bytes)",
                stride, row_bytes
            )));
        }

        let required = stride as usize * (height as usize - 1) + row_bytes;
        if data.len() < required {
            return Err(CameraError::ReadFailed(format!(
                "{} frame {}x{} needs {} bytes, got {}",
                format,
                width,
                height,
                required,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
            captured_at: Instant::now(),
        })
    }

    /// Create a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CameraError> {
        Self::new(width, height, width * 4, PixelFormat::Rgba, data)
    }

    /// Create a tightly packed grayscale frame
    pub fn from_gray(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CameraError> {
        Self::new(width, height, width, PixelFormat::Gray8, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row including padding
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel bytes, rows `stride` apart
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// When the frame left the source
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Bytes of one row, without padding
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        let len = self.width as usize * self.format.bytes_per_pixel() as usize;
        &self.data[start..start + len]
    }

    /// Copy of this frame with the row order reversed (top becomes bottom)
    ///
    /// The copy is tightly packed even if the source rows were padded.
    pub fn flipped_vertically(&self) -> Frame {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel() as usize;
        let mut data = Vec::with_capacity(row_bytes * self.height as usize);
        for y in (0..self.height).rev() {
            data.extend_from_slice(self.row(y));
        }

        Frame {
            width: self.width,
            height: self.height,
            stride: row_bytes as u32,
            format: self.format,
            data: Arc::from(data),
            captured_at: self.captured_at,
        }
    }

    /// Tightly packed RGBA copy of the frame
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            let row = self.row(y);
            match self.format {
                PixelFormat::Rgba => rgba.extend_from_slice(row),
                PixelFormat::Rgb24 => format_converters::rgb24_to_rgba_into(row, &mut rgba),
                PixelFormat::Gray8 => format_converters::gray_to_rgba_into(row, &mut rgba),
                PixelFormat::Yuyv => format_converters::yuyv_to_rgba_into(row, &mut rgba),
            }
        }
        rgba
    }

    /// Tightly packed 8-bit luma copy of the frame
    pub fn to_luma(&self) -> Vec<u8> {
        let mut luma = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            let row = self.row(y);
            match self.format {
                PixelFormat::Gray8 => luma.extend_from_slice(row),
                // Y samples sit on every even byte
                PixelFormat::Yuyv => luma.extend(row.iter().step_by(2)),
                PixelFormat::Rgba => {
                    luma.extend(row.chunks_exact(4).map(|p| format_converters::luma(p[0], p[1], p[2])))
                }
                PixelFormat::Rgb24 => {
                    luma.extend(row.chunks_exact(3).map(|p| format_converters::luma(p[0], p[1], p[2])))
                }
            }
        }
        luma
    }
}

/// Description of a capture device found on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Device index (`/dev/video<index>`)
    pub index: usize,
    /// Human readable name reported by the driver
    pub name: String,
    /// Device node path
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_buffer() {
        let err = Frame::from_rgba(4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(err, CameraError::ReadFailed(_)));
    }

    #[test]
    fn test_rejects_stride_shorter_than_row() {
        let err = Frame::new(4, 2, 3, PixelFormat::Gray8, vec![0u8; 16]).unwrap_err();
        assert!(matches!(err, CameraError::ReadFailed(_)));
    }

    #[test]
    fn test_last_row_may_skip_padding() {
        // 3x2 RGB24 with 12-byte stride: 12 + 9 bytes covers both rows
        let frame = Frame::new(3, 2, 12, PixelFormat::Rgb24, vec![7u8; 21]).unwrap();
        assert_eq!(frame.row(1).len(), 9);
        assert!(Frame::new(3, 2, 12, PixelFormat::Rgb24, vec![7u8; 20]).is_err());
    }

    #[test]
    fn test_every_row_of_a_validated_frame_is_in_bounds() {
        let frame = Frame::new(5, 3, 8, PixelFormat::Gray8, vec![1u8; 21]).unwrap();
        for y in 0..frame.height() {
            assert_eq!(frame.row(y).len(), frame.width() as usize);
        }
        assert_eq!(frame.stride(), 8);
        assert_eq!(frame.data().len(), 21);
        assert_eq!(frame.format(), PixelFormat::Gray8);
    }

    #[test]
    fn test_rejects_odd_yuyv_width() {
        assert!(Frame::new(3, 1, 6, PixelFormat::Yuyv, vec![0u8; 6]).is_err());
    }

    #[test]
    fn test_flip_drops_stride_padding() {
        // 2x2 gray frame, rows padded to 3 bytes
        let frame = Frame::new(2, 2, 3, PixelFormat::Gray8, vec![1u8, 2, 0, 3, 4, 0]).unwrap();
        let flipped = frame.flipped_vertically();

        assert_eq!(flipped.stride, 2);
        assert_eq!(&flipped.data[..], &[3, 4, 1, 2]);
    }

    #[test]
    fn test_flip_twice_restores_rows() {
        let frame = Frame::from_gray(1, 3, vec![10, 20, 30]).unwrap();
        let back = frame.flipped_vertically().flipped_vertically();
        assert_eq!(&back.data[..], &frame.data[..]);
    }

    #[test]
    fn test_luma_from_yuyv_takes_y_samples() {
        let frame = Frame::new(2, 1, 4, PixelFormat::Yuyv, vec![50u8, 128, 200, 128]).unwrap();
        assert_eq!(frame.to_luma(), vec![50, 200]);
    }
}
