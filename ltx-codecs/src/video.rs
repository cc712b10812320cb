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

//! Video codec seams.

use serde::{Deserialize, Serialize};

use crate::{CodecError, VideoFrame};

/// Settings for one encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEncoderConfig {
    pub width: u32,
    pub height: u32,
    /// Target bitrate in bits per second.
    pub bit_rate: u32,
    pub frame_rate: u32,
}

impl VideoEncoderConfig {
    /// Reject configurations no VP9 encoder accepts: zero or odd dimensions,
    /// zero bitrate or frame rate.
    pub fn check_supported(&self) -> Result<(), CodecError> {
        if self.width == 0 || self.width % 2 != 0 {
            return Err(CodecError::Unsupported(format!(
                "width {} must be even and non-zero",
                self.width
            )));
        }
        if self.height == 0 || self.height % 2 != 0 {
            return Err(CodecError::Unsupported(format!(
                "height {} must be even and non-zero",
                self.height
            )));
        }
        if self.width > u16::MAX as u32 || self.height > u16::MAX as u32 {
            return Err(CodecError::Unsupported(format!(
                "{}x{} exceeds the container limit",
                self.width, self.height
            )));
        }
        if self.bit_rate == 0 {
            return Err(CodecError::Unsupported("bit rate must be non-zero".into()));
        }
        if self.frame_rate == 0 {
            return Err(CodecError::Unsupported("frame rate must be non-zero".into()));
        }
        Ok(())
    }
}

/// Whether frame `index` of a conditioning video must be a keyframe: the
/// first frame and the first frame of every following 8-frame latent group.
pub fn is_keyframe(index: usize) -> bool {
    index == 0 || (index - 1) % 8 == 0
}

/// Compresses a frame sequence into a single video buffer.
pub trait VideoEncoder {
    fn encode(
        &mut self,
        frames: &[VideoFrame],
        config: &VideoEncoderConfig,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Decompresses a video buffer into its frames.
pub trait VideoDecoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<VideoFrame>, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: u32, height: u32) -> VideoEncoderConfig {
        VideoEncoderConfig {
            width,
            height,
            bit_rate: 1_000_000,
            frame_rate: 25,
        }
    }

    #[test]
    fn test_supported_config() {
        assert!(config(768, 512).check_supported().is_ok());
    }

    #[test]
    fn test_odd_dimensions_are_unsupported() {
        assert!(matches!(
            config(767, 512).check_supported(),
            Err(CodecError::Unsupported(_))
        ));
        assert!(matches!(
            config(768, 0).check_supported(),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[test]
    fn test_zero_rates_are_unsupported() {
        let mut c = config(64, 64);
        c.bit_rate = 0;
        assert!(c.check_supported().is_err());
        let mut c = config(64, 64);
        c.frame_rate = 0;
        assert!(c.check_supported().is_err());
    }

    #[test]
    fn test_keyframe_positions() {
        let keys: Vec<usize> = (0..25).filter(|i| is_keyframe(*i)).collect();
        assert_eq!(keys, vec![0, 1, 9, 17]);
    }
}
