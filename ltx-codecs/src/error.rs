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

use thiserror::Error;

/// Errors raised by image and video codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The requested encoder configuration cannot be honoured.
    #[error("encoder configuration not supported: {0}")]
    Unsupported(String),
    /// The container holds no track this client knows how to decode.
    #[error("no decodable video track found: {0}")]
    MissingTrack(String),
    /// The container bytes are truncated or malformed.
    #[error("malformed container: {0}")]
    Container(String),
    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    InvalidFrame { width: u32, height: u32, len: usize },
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// libvpx reported an error.
    #[error("vpx: {0}")]
    Vpx(String),
}
