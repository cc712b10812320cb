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

//! Decoded RGBA frames.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::CodecError;

/// A decoded RGBA frame.
///
/// Pixels are shared, so cloning a frame (e.g. padding a sequence with the
/// same placeholder many times) does not copy the image.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    image: Arc<RgbaImage>,
}

impl VideoFrame {
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Wrap a raw `width * height * 4` RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CodecError> {
        let len = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(Self::from_image)
            .ok_or(CodecError::InvalidFrame { width, height, len })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Whether two frames share the same pixel storage.
    pub fn ptr_eq(&self, other: &VideoFrame) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl From<RgbaImage> for VideoFrame {
    fn from(image: RgbaImage) -> Self {
        Self::from_image(image)
    }
}

/// A frame filled with a single colour.
pub fn solid_color_frame(width: u32, height: u32, color: [u8; 4]) -> VideoFrame {
    VideoFrame::from_image(RgbaImage::from_pixel(width, height, Rgba(color)))
}

/// Scale `source` preserving its aspect ratio until it covers
/// `width x height`, centre it and crop the overflow. Uncovered pixels are
/// opaque black.
pub fn fit_cover(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    if source.width() == 0 || source.height() == 0 {
        return canvas;
    }

    let h_ratio = width as f64 / source.width() as f64;
    let v_ratio = height as f64 / source.height() as f64;
    let ratio = h_ratio.max(v_ratio);
    let scaled_width = ((source.width() as f64 * ratio).round() as u32).max(1);
    let scaled_height = ((source.height() as f64 * ratio).round() as u32).max(1);

    let scaled = imageops::resize(source, scaled_width, scaled_height, FilterType::Triangle);
    let pos_x = (width as i64 - scaled_width as i64) / 2;
    let pos_y = (height as i64 - scaled_height as i64) / 2;
    imageops::overlay(&mut canvas, &scaled, pos_x, pos_y);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_frame() {
        let frame = solid_color_frame(4, 2, [128, 128, 128, 255]);
        assert_eq!((frame.width(), frame.height()), (4, 2));
        assert!(frame.image().pixels().all(|p| p.0 == [128, 128, 128, 255]));
    }

    #[test]
    fn test_from_rgba_rejects_short_buffer() {
        let err = VideoFrame::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFrame { len: 15, .. }));
    }

    #[test]
    fn test_clone_shares_pixels() {
        let frame = solid_color_frame(2, 2, [0, 0, 0, 255]);
        let copy = frame.clone();
        assert!(frame.ptr_eq(&copy));
        assert!(!frame.ptr_eq(&solid_color_frame(2, 2, [0, 0, 0, 255])));
    }

    #[test]
    fn test_fit_cover_wide_source_is_cropped() {
        // 4x1 red strip into a 2x2 target: scaled to 8x2, centred, cropped.
        let source = RgbaImage::from_pixel(4, 1, Rgba([255, 0, 0, 255]));
        let out = fit_cover(&source, 2, 2);
        assert_eq!(out.dimensions(), (2, 2));
        assert!(out.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_fit_cover_keeps_target_size() {
        let source = RgbaImage::from_pixel(100, 50, Rgba([10, 20, 30, 255]));
        let out = fit_cover(&source, 64, 48);
        assert_eq!(out.dimensions(), (64, 48));
    }
}
