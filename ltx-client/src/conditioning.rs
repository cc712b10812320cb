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

//! Builds the conditioning video and latent masks for the next chunk.
//!
//! The backend model compresses time by [`FRAMES_PER_LATENT`]: one latent
//! covers the first frame and every following group of eight. The
//! assembler hands it the tail of what was already generated, padded with
//! gray frames, and one mask per latent telling it which latents hold real
//! frames (white) and which must be generated (black).

use log::debug;
use ltx_codecs::{CodecError, ImageEncoder, VideoEncoder, VideoEncoderConfig, VideoFrame};
use ltx_types::ConditioningPayload;
use thiserror::Error;

use crate::frame_store::FrameStore;
use crate::placeholder::PlaceholderCache;

/// Raw frames per latent group.
pub const FRAMES_PER_LATENT: usize = 8;

#[derive(Debug, Error)]
pub enum ConditioningError {
    #[error("a chunk must contain at least one frame")]
    EmptyChunk,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Output of [`ConditioningAssembler::prepare_conditioning_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditioningItems {
    pub video_bytes: Vec<u8>,
    pub masks_bytes: Vec<Vec<u8>>,
    pub num_available_latents: usize,
    pub num_total_latents: usize,
}

impl From<ConditioningItems> for ConditioningPayload {
    fn from(items: ConditioningItems) -> Self {
        ConditioningPayload {
            video_bytes: items.video_bytes,
            masks_bytes: items.masks_bytes,
        }
    }
}

/// Latents needed to describe `frames` raw frames.
pub fn latents_for_frames(frames: usize) -> usize {
    1 + frames / FRAMES_PER_LATENT
}

pub struct ConditioningAssembler<V, I> {
    video_encoder: V,
    image_encoder: I,
    placeholders: PlaceholderCache,
}

impl<V: VideoEncoder, I: ImageEncoder> ConditioningAssembler<V, I> {
    pub fn new(video_encoder: V, image_encoder: I) -> Self {
        Self {
            video_encoder,
            image_encoder,
            placeholders: PlaceholderCache::new(),
        }
    }

    pub fn placeholders(&self) -> &PlaceholderCache {
        &self.placeholders
    }

    /// Assemble conditioning for a chunk of `chunk_total_frames` frames of
    /// which `chunk_frames_to_add` are new.
    ///
    /// An empty store yields an all-gray video with every mask black.
    pub fn prepare_conditioning_items(
        &mut self,
        store: &FrameStore,
        chunk_total_frames: usize,
        chunk_frames_to_add: usize,
        bit_rate: u32,
        frame_rate: u32,
    ) -> Result<ConditioningItems, ConditioningError> {
        if chunk_total_frames == 0 {
            return Err(ConditioningError::EmptyChunk);
        }
        let placeholders =
            self.placeholders
                .ensure(store.width(), store.height(), &self.image_encoder)?;

        let num_wanted = chunk_total_frames.saturating_sub(chunk_frames_to_add);
        let available = store.tail(num_wanted);
        let num_available_frames = available.len();

        let num_total_latents = latents_for_frames(chunk_total_frames);
        let num_available_latents = if num_available_frames == 0 {
            0
        } else {
            latents_for_frames(num_available_frames).min(num_total_latents)
        };

        let mut frames: Vec<VideoFrame> = Vec::with_capacity(chunk_total_frames);
        frames.extend_from_slice(available);
        frames.resize(chunk_total_frames, placeholders.gray.frame.clone());

        let mut masks_bytes = Vec::with_capacity(num_total_latents);
        masks_bytes.resize(num_available_latents, placeholders.white.bytes.clone());
        masks_bytes.resize(num_total_latents, placeholders.black.bytes.clone());

        debug!(
            "conditioning: {num_available_frames}/{num_wanted} frames, \
             {num_available_latents}/{num_total_latents} latents available"
        );

        let config = VideoEncoderConfig {
            width: store.width(),
            height: store.height(),
            bit_rate,
            frame_rate,
        };
        let video_bytes = self.video_encoder.encode(&frames, &config)?;

        Ok(ConditioningItems {
            video_bytes,
            masks_bytes,
            num_available_latents,
            num_total_latents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latents_for_frames() {
        assert_eq!(latents_for_frames(0), 1);
        assert_eq!(latents_for_frames(7), 1);
        assert_eq!(latents_for_frames(8), 2);
        assert_eq!(latents_for_frames(25), 4);
        assert_eq!(latents_for_frames(97), 13);
    }

    #[test]
    fn test_into_payload() {
        let items = ConditioningItems {
            video_bytes: vec![1, 2],
            masks_bytes: vec![vec![3]],
            num_available_latents: 1,
            num_total_latents: 1,
        };
        let payload: ConditioningPayload = items.into();
        assert_eq!(payload.video_bytes, vec![1, 2]);
        assert_eq!(payload.masks_bytes, vec![vec![3]]);
    }
}
