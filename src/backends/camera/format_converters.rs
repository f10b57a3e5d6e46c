// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion helpers
//!
//! Conversions work on single, unpadded rows and append to an output buffer,
//! so callers can strip stride padding and convert in one pass.

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// BT.601 luma of an RGB pixel
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// Append one YUYV row as RGBA
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
pub fn yuyv_to_rgba_into(row: &[u8], out: &mut Vec<u8>) {
    for chunk in row.chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        for luma in [y0, y1] {
            let (r, g, b) = yuv_to_rgb(luma, u, v);
            out.extend_from_slice(&[r, g, b, 255]);
        }
    }
}

/// Append one RGB24 row as RGBA
pub fn rgb24_to_rgba_into(row: &[u8], out: &mut Vec<u8>) {
    for px in row.chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
}

/// Append one grayscale row as RGBA
pub fn gray_to_rgba_into(row: &[u8], out: &mut Vec<u8>) {
    for &v in row {
        out.extend_from_slice(&[v, v, v, 255]);
    }
}

/// Mirror a packed RGBA image left-to-right in place
pub fn mirror_rgba_horizontally(rgba: &mut [u8], width: u32) {
    let row_bytes = width as usize * 4;
    if row_bytes == 0 {
        return;
    }
    for row in rgba.chunks_exact_mut(row_bytes) {
        let pixels = row.len() / 4;
        for x in 0..pixels / 2 {
            let (left, right) = (x * 4, (pixels - 1 - x) * 4);
            for c in 0..4 {
                row.swap(left + c, right + c);
            }
        }
    }
}

/// Downscale a packed 8-bit plane using bilinear interpolation
pub fn downscale_luma(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Vec<u8> {
    let sw = src_width as usize;
    let sh = src_height as usize;
    let mut result = Vec::with_capacity(dst_width as usize * dst_height as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    let get = |px: usize, py: usize| -> f32 { src.get(py * sw + px).copied().unwrap_or(0) as f32 };

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = (src_x as usize).min(sw - 1);
            let y0 = (src_y as usize).min(sh - 1);
            let x1 = (x0 + 1).min(sw - 1);
            let y1 = (y0 + 1).min(sh - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let value = get(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                + get(x1, y0) * x_frac * (1.0 - y_frac)
                + get(x0, y1) * (1.0 - x_frac) * y_frac
                + get(x1, y1) * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}
