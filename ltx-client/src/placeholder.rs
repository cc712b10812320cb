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

//! Fixed-colour reference frames used to pad conditioning video and to
//! build latent masks.

use log::debug;
use ltx_codecs::{solid_color_frame, CodecError, ImageEncoder, VideoFrame};

pub const BLACK: [u8; 4] = [0, 0, 0, 255];
pub const GRAY: [u8; 4] = [128, 128, 128, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// A solid frame and its encoded image bytes.
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub frame: VideoFrame,
    pub bytes: Vec<u8>,
}

impl Placeholder {
    fn build(
        width: u32,
        height: u32,
        color: [u8; 4],
        encoder: &dyn ImageEncoder,
    ) -> Result<Self, CodecError> {
        let frame = solid_color_frame(width, height, color);
        let bytes = encoder.encode_image(&frame)?;
        Ok(Self { frame, bytes })
    }
}

#[derive(Debug, Clone)]
pub struct Placeholders {
    pub black: Placeholder,
    pub gray: Placeholder,
    pub white: Placeholder,
}

/// Caches [`Placeholders`] for one resolution.
#[derive(Debug, Default)]
pub struct PlaceholderCache {
    size: Option<(u32, u32)>,
    placeholders: Option<Placeholders>,
}

impl PlaceholderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return placeholders sized `width x height`, building them only when
    /// the cache is empty or holds another size.
    pub fn ensure(
        &mut self,
        width: u32,
        height: u32,
        encoder: &dyn ImageEncoder,
    ) -> Result<&Placeholders, CodecError> {
        let stale = self.size != Some((width, height)) || self.placeholders.is_none();
        if stale {
            debug!("building placeholder frames at {width}x{height}");
            let placeholders = Placeholders {
                black: Placeholder::build(width, height, BLACK, encoder)?,
                gray: Placeholder::build(width, height, GRAY, encoder)?,
                white: Placeholder::build(width, height, WHITE, encoder)?,
            };
            self.size = Some((width, height));
            self.placeholders = Some(placeholders);
        }
        self.placeholders
            .as_ref()
            .ok_or_else(|| CodecError::Unsupported("placeholders unavailable".into()))
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }
}
