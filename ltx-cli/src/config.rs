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

//! Loads [`GenerationSettings`] from YAML and applies command-line overrides.

use std::fs;
use std::path::Path;

use ltx_client::GenerationSettings;

use crate::cli_args::Generate;

pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<GenerationSettings> {
    let content = fs::read_to_string(path)?;
    let settings: GenerationSettings = serde_yaml::from_str(&content)?;
    Ok(settings)
}

/// Settings from `--config` (or defaults) with flags applied on top.
pub fn load(args: &Generate) -> anyhow::Result<GenerationSettings> {
    let mut settings = match &args.config {
        Some(path) => from_file(path)?,
        None => GenerationSettings::default(),
    };
    apply_overrides(&mut settings, args);
    Ok(settings)
}

fn apply_overrides(settings: &mut GenerationSettings, args: &Generate) {
    if let Some(url) = &args.url {
        settings.websocket_url = url.clone();
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(prompt) = &args.prompt {
        settings.prompt = prompt.clone();
    }
    if let Some(negative_prompt) = &args.negative_prompt {
        settings.negative_prompt = negative_prompt.clone();
    }
    if let Some((width, height)) = args.resolution {
        settings.width = width;
        settings.height = height;
    }
    if let Some(num_frames) = args.num_frames {
        settings.num_frames = num_frames;
    }
    if let Some(pop_latents) = args.pop_latents {
        settings.pop_latents = pop_latents;
    }
}
