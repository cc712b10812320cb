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

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// LTX generation CLI
///
/// Connects to an LTX pipeline server, generates video chunk after chunk and
/// writes each chunk to disk as it arrives.
#[derive(Parser, Debug)]
#[clap(name = "ltx-cli")]
pub struct Opt {
    #[clap(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Generate a sequence of chunks.
    Generate(Generate),
}

#[derive(Args, Debug, Clone)]
pub struct Generate {
    /// YAML file with generation settings. Flags below override it.
    #[clap(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// WebSocket URL of the pipeline server.
    #[clap(long = "url")]
    pub url: Option<String>,

    #[clap(long = "seed")]
    pub seed: Option<u64>,

    #[clap(long = "prompt", short = 'p')]
    pub prompt: Option<String>,

    #[clap(long = "negative-prompt")]
    pub negative_prompt: Option<String>,

    /// Resolution in WIDTHxHEIGHT format (e.g., 768x512)
    #[clap(long = "resolution", short = 'r', value_parser = parse_resolution)]
    pub resolution: Option<(u32, u32)>,

    /// Frames per chunk.
    #[clap(long = "num-frames")]
    pub num_frames: Option<u32>,

    /// Trailing latent groups regenerated between chunks.
    #[clap(long = "pop-latents")]
    pub pop_latents: Option<u32>,

    /// Stop after this many chunks.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub chunks: u32,

    #[clap(long = "output-dir", short = 'o', default_value = "ltx-output")]
    pub output_dir: PathBuf,

    /// Image used to condition the first chunk.
    #[clap(long = "init-image")]
    pub init_image: Option<PathBuf>,

    /// Send one command at a time and wait for each reply, instead of
    /// queueing commands.
    #[clap(long = "single-in-flight")]
    pub single_in_flight: bool,
}

fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid width: {e}"))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid height: {e}"))?;
    if width == 0 || height == 0 {
        return Err("resolution must be non-zero".into());
    }
    Ok((width, height))
}
