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

//! User-editable generation settings and the application state around them.

use std::sync::Arc;

use log::debug;
use ltx_types::{Command, ConditioningPayload, PipelineArgs};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::conditioning::FRAMES_PER_LATENT;
use crate::event_bus::EventBus;
use crate::events::ClientEvent;

pub const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_PROMPT: &str = "A clear, turquoise river flows through a rocky canyon, cascading over a small waterfall and forming a pool of water at the bottom.The river is the main focus of the scene, with its clear water reflecting the surrounding trees and rocks. The canyon walls are steep and rocky, with some vegetation growing on them. The trees are mostly pine trees, with their green needles contrasting with the brown and gray rocks. The overall tone of the scene is one of peace and tranquility.";
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "worst quality, inconsistent motion, blurry, jittery, distorted";

/// Seeds are drawn from `0..MAX_SEED`.
pub const MAX_SEED: u64 = 999_999_999;

/// Settings a user can edit between generations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub websocket_url: String,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub prompt: String,
    pub negative_prompt: String,
    /// Frames per generated chunk.
    pub num_frames: u32,
    pub frame_rate: u32,
    pub num_inference_steps: u32,
    /// Trailing latent groups regenerated between chunks.
    pub pop_latents: u32,
    /// Bitrate of the conditioning video sent to the backend, in bits/s.
    pub bit_rate: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            websocket_url: DEFAULT_WEBSOCKET_URL.to_string(),
            width: 768,
            height: 512,
            seed: rand::thread_rng().gen_range(0..MAX_SEED),
            prompt: DEFAULT_PROMPT.to_string(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            num_frames: 25,
            frame_rate: 25,
            num_inference_steps: 25,
            pop_latents: 2,
            bit_rate: 2_000_000,
        }
    }
}

impl GenerationSettings {
    pub fn pipeline_args(&self) -> PipelineArgs {
        PipelineArgs {
            prompt: self.prompt.clone(),
            negative_prompt: self.negative_prompt.clone(),
            num_frames: self.num_frames,
            frame_rate: self.frame_rate,
            num_inference_steps: self.num_inference_steps,
        }
    }

    /// Frames regenerated per continuation chunk: the popped latent groups,
    /// capped at the chunk length.
    pub fn frames_to_add(&self) -> u32 {
        self.pop_latents
            .saturating_mul(FRAMES_PER_LATENT as u32)
            .min(self.num_frames)
    }

    /// Leading frames of a continuation chunk that repeat what was already
    /// shown: `max(0, num_frames - pop_latents * 8)`.
    pub fn frames_to_skip(&self) -> u32 {
        self.num_frames
            .saturating_sub(self.pop_latents.saturating_mul(FRAMES_PER_LATENT as u32))
    }
}

/// A chunk of generated video, ready to hand to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub video_bytes: Arc<[u8]>,
    pub frame_rate: u32,
    /// Leading frames a player should skip.
    pub frames_to_skip: u32,
}

/// Settings plus the latest generation, shared by the session and the UI.
#[derive(Debug)]
pub struct AppState {
    settings: GenerationSettings,
    most_recent_generation: Option<Generation>,
    bus: EventBus,
}

impl AppState {
    pub fn new(settings: GenerationSettings, bus: EventBus) -> Self {
        Self {
            settings,
            most_recent_generation: None,
            bus,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Edit the settings and notify subscribers.
    pub fn update_settings(&mut self, f: impl FnOnce(&mut GenerationSettings)) {
        f(&mut self.settings);
        debug!("generation settings updated");
        self.bus
            .publish(ClientEvent::SettingsChanged(self.settings.clone()));
    }

    pub fn most_recent_generation(&self) -> Option<&Generation> {
        self.most_recent_generation.as_ref()
    }

    pub fn record_generation(&mut self, generation: Generation) {
        self.most_recent_generation = Some(generation);
    }

    pub fn build_set_pipeline_args_message(&self) -> Command {
        Command::SetPipelineArgs {
            seed: self.settings.seed,
            pipeline_args: self.settings.pipeline_args(),
        }
    }

    pub fn build_update_prompt_message(&self) -> Command {
        Command::UpdatePrompt
    }

    pub fn build_update_conditioning_message(
        &self,
        allow_pop_latents: bool,
        conditioning: Option<ConditioningPayload>,
    ) -> Command {
        let pop_latents = allow_pop_latents.then_some(self.settings.pop_latents);
        Command::update_conditioning(pop_latents, conditioning)
    }

    pub fn build_generate_message(&self) -> Command {
        Command::Generate
    }
}
