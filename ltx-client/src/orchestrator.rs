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

//! The generate-again loop.
//!
//! The orchestrator never talks to the session directly. It turns settings
//! and generated output into the commands for the next step and leaves
//! delivering them to a [`Dispatcher`](crate::Dispatcher).

use log::{debug, info};
use ltx_codecs::{ImageEncoder, VideoDecoder, VideoEncoder};
use ltx_types::Command;

use crate::conditioning::{ConditioningAssembler, ConditioningError};
use crate::frame_store::FrameStore;
use crate::settings::{AppState, Generation};

pub struct Orchestrator<V, I, D> {
    store: FrameStore,
    assembler: ConditioningAssembler<V, I>,
    decoder: D,
    chunks_generated: usize,
    max_chunks: Option<usize>,
}

impl<V, I, D> Orchestrator<V, I, D>
where
    V: VideoEncoder,
    I: ImageEncoder,
    D: VideoDecoder,
{
    pub fn new(store: FrameStore, assembler: ConditioningAssembler<V, I>, decoder: D) -> Self {
        Self {
            store,
            assembler,
            decoder,
            chunks_generated: 0,
            max_chunks: None,
        }
    }

    /// Stop asking for more output after `max_chunks` chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = Some(max_chunks);
        self
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut FrameStore {
        &mut self.store
    }

    pub fn chunks_generated(&self) -> usize {
        self.chunks_generated
    }

    pub fn finished(&self) -> bool {
        self.max_chunks
            .is_some_and(|max| self.chunks_generated >= max)
    }

    /// Commands for the first chunk. Frames already in the store (e.g. an
    /// initial image) condition it; latents are never popped.
    pub fn start(&mut self, state: &AppState) -> Result<Vec<Command>, ConditioningError> {
        let settings = state.settings();
        let conditioning = if self.store.is_empty() {
            None
        } else {
            let total = settings.num_frames as usize;
            let items = self.assembler.prepare_conditioning_items(
                &self.store,
                total,
                total.saturating_sub(self.store.len()),
                settings.bit_rate,
                settings.frame_rate,
            )?;
            Some(items.into())
        };
        info!(
            "starting generation (seed {}, {} conditioning frames)",
            settings.seed,
            self.store.len()
        );
        Ok(vec![
            state.build_set_pipeline_args_message(),
            state.build_update_prompt_message(),
            state.build_update_conditioning_message(false, conditioning),
            state.build_generate_message(),
        ])
    }

    /// Append a generated chunk to the store and return the commands for
    /// the next one, or `None` once the chunk limit is reached.
    pub fn on_output(
        &mut self,
        state: &AppState,
        generation: &Generation,
    ) -> Result<Option<Vec<Command>>, ConditioningError> {
        let frames = self.decoder.decode(&generation.video_bytes)?;
        let added = self
            .store
            .extend_from_output(frames, generation.frames_to_skip as usize);
        self.chunks_generated += 1;
        debug!(
            "chunk {} added {added} frames ({} total)",
            self.chunks_generated,
            self.store.len()
        );

        if self.finished() {
            info!("generated {} chunks, stopping", self.chunks_generated);
            return Ok(None);
        }

        let settings = state.settings();
        let items = self.assembler.prepare_conditioning_items(
            &self.store,
            settings.num_frames as usize,
            settings.frames_to_add() as usize,
            settings.bit_rate,
            settings.frame_rate,
        )?;
        Ok(Some(vec![
            state.build_update_conditioning_message(true, Some(items.into())),
            state.build_generate_message(),
        ]))
    }
}
