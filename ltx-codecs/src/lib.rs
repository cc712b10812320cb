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

//! Frame, image and video codecs for the LTX pipeline client.
//!
//! The traits in [`video`] and [`image_codec`] are the seams the client
//! talks to; the concrete VP9 implementations live behind the `vpx` feature.

pub mod error;
pub mod frame;
pub mod image_codec;
pub mod ivf;
pub mod video;
pub mod yuv;

#[cfg(feature = "vpx")]
pub mod decoder;
#[cfg(feature = "vpx")]
pub mod encoder;

pub use error::CodecError;
pub use frame::{fit_cover, solid_color_frame, VideoFrame};
pub use image_codec::{open_image_file, ImageDecoder, ImageEncoder, PngImageCodec};
pub use video::{VideoDecoder, VideoEncoder, VideoEncoderConfig};
