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

//! Still-image encoding and decoding.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader, RgbaImage};
use log::debug;

use crate::{CodecError, VideoFrame};

/// Compresses a frame into a standalone image file.
pub trait ImageEncoder {
    fn encode_image(&self, frame: &VideoFrame) -> Result<Vec<u8>, CodecError>;
}

/// Decompresses a standalone image file into a frame.
pub trait ImageDecoder {
    fn decode_image(&self, bytes: &[u8]) -> Result<VideoFrame, CodecError>;
}

/// Lossless PNG codec, used for placeholders and mask images.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngImageCodec;

impl ImageEncoder for PngImageCodec {
    fn encode_image(&self, frame: &VideoFrame) -> Result<Vec<u8>, CodecError> {
        let mut bytes = Vec::new();
        frame
            .image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

impl ImageDecoder for PngImageCodec {
    fn decode_image(&self, bytes: &[u8]) -> Result<VideoFrame, CodecError> {
        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?;
        Ok(VideoFrame::from_image(image.to_rgba8()))
    }
}

/// Load the image at `path`.
///
/// Returns `Ok(None)` when the file exists but is not a recognised image
/// format, so callers can treat it like a cancelled selection.
pub fn open_image_file(path: impl AsRef<Path>) -> Result<Option<RgbaImage>, CodecError> {
    let path = path.as_ref();
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    if reader.format().is_none() {
        debug!("{} is not a recognised image", path.display());
        return Ok(None);
    }
    Ok(Some(reader.decode()?.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solid_color_frame;

    #[test]
    fn test_png_round_trip_is_lossless() {
        let frame = solid_color_frame(3, 5, [255, 255, 255, 255]);
        let bytes = PngImageCodec.encode_image(&frame).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = PngImageCodec.decode_image(&bytes).unwrap();
        assert_eq!(decoded.image(), frame.image());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(PngImageCodec.decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn test_open_image_file_returns_none_for_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();
        assert!(open_image_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_open_image_file_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("start.png");
        let frame = solid_color_frame(6, 4, [1, 2, 3, 255]);
        std::fs::write(&path, PngImageCodec.encode_image(&frame).unwrap()).unwrap();

        let image = open_image_file(&path).unwrap().unwrap();
        assert_eq!(image.dimensions(), (6, 4));
    }

    #[test]
    fn test_open_image_file_missing_path_is_error() {
        assert!(open_image_file("/nonexistent/ltx/start.png").is_err());
    }
}
