/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! BT.601 conversions between packed RGBA and planar I420.

use image::{Rgba, RgbaImage};

/// Size in bytes of an I420 buffer for `width x height` (even dimensions).
pub fn i420_len(width: u32, height: u32) -> usize {
    let (w, h) = (width as usize, height as usize);
    w * h + 2 * (w / 2) * (h / 2)
}

/// Convert an RGBA image with even dimensions to I420. Alpha is ignored;
/// chroma is sampled from the top-left pixel of each 2x2 block.
pub fn rgba_to_i420(image: &RgbaImage) -> Vec<u8> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let mut i420_data = vec![0u8; i420_len(image.width(), image.height())];

    let rgba = image.as_raw();
    let (y_plane, uv_planes) = i420_data.split_at_mut(width * height);
    let (u_plane, v_plane) = uv_planes.split_at_mut((width / 2) * (height / 2));

    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) * 4;
            let r = rgba[index] as f32;
            let g = rgba[index + 1] as f32;
            let b = rgba[index + 2] as f32;

            y_plane[y * width + x] = (0.257 * r + 0.504 * g + 0.098 * b + 16.0).round() as u8;

            if y % 2 == 0 && x % 2 == 0 && x / 2 < width / 2 && y / 2 < height / 2 {
                let uv_index = (y / 2) * (width / 2) + (x / 2);
                u_plane[uv_index] = (-0.148 * r - 0.291 * g + 0.439 * b + 128.0).round() as u8;
                v_plane[uv_index] = (0.439 * r - 0.368 * g - 0.071 * b + 128.0).round() as u8;
            }
        }
    }

    i420_data
}

/// Convert tightly packed I420 planes back to opaque RGBA.
pub fn i420_to_rgba(y_plane: &[u8], u_plane: &[u8], v_plane: &[u8], width: u32, height: u32) -> RgbaImage {
    let chroma_width = width.div_ceil(2).max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        let y_idx = (y * width + x) as usize;
        let uv_idx = ((y / 2) * chroma_width + (x / 2).min(chroma_width - 1)) as usize;

        let c = y_plane.get(y_idx).copied().unwrap_or(16) as f32 - 16.0;
        let d = u_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;
        let e = v_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;

        let r = (1.164 * c + 1.596 * e).round().clamp(0.0, 255.0) as u8;
        let g = (1.164 * c - 0.813 * e - 0.392 * d).round().clamp(0.0, 255.0) as u8;
        let b = (1.164 * c + 2.017 * d).round().clamp(0.0, 255.0) as u8;
        Rgba([r, g, b, 255])
    })
}
