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

//! Commands sent to the pipeline backend and the replies it returns.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

/// Errors raised while encoding or decoding a wire frame.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Generation parameters forwarded verbatim to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineArgs {
    pub prompt: String,
    pub negative_prompt: String,
    pub num_frames: u32,
    pub frame_rate: u32,
    pub num_inference_steps: u32,
}

/// Encoded conditioning video plus one encoded mask image per latent group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditioningPayload {
    pub video_bytes: Vec<u8>,
    pub masks_bytes: Vec<Vec<u8>>,
}

/// A command understood by the backend, tagged on the wire by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    CreatePipeline,
    SetPipelineArgs {
        seed: u64,
        pipeline_args: PipelineArgs,
    },
    UpdatePrompt,
    UpdateConditioning {
        /// Trailing latent groups the backend should drop before the next
        /// chunk. Always present on the wire, `nil` when popping is not allowed.
        pop_latents: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        video_bytes: Option<ByteBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        masks_bytes: Option<Vec<ByteBuf>>,
    },
    Generate,
}

impl Command {
    /// Build an `UPDATE_CONDITIONING` command, attaching the conditioning
    /// payload only when one is supplied.
    pub fn update_conditioning(
        pop_latents: Option<u32>,
        conditioning: Option<ConditioningPayload>,
    ) -> Self {
        match conditioning {
            Some(payload) => Command::UpdateConditioning {
                pop_latents,
                video_bytes: Some(ByteBuf::from(payload.video_bytes)),
                masks_bytes: Some(payload.masks_bytes.into_iter().map(ByteBuf::from).collect()),
            },
            None => Command::UpdateConditioning {
                pop_latents,
                video_bytes: None,
                masks_bytes: None,
            },
        }
    }

    /// The wire name of this command, as found in the `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreatePipeline => "CREATE_PIPELINE",
            Command::SetPipelineArgs { .. } => "SET_PIPELINE_ARGS",
            Command::UpdatePrompt => "UPDATE_PROMPT",
            Command::UpdateConditioning { .. } => "UPDATE_CONDITIONING",
            Command::Generate => "GENERATE",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A command stamped with the id the session assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(flatten)]
    pub command: Command,
    pub id: u32,
}

impl OutboundMessage {
    pub fn new(id: u32, command: Command) -> Self {
        Self { command, id }
    }

    /// Serialize as a msgpack map (struct fields keyed by name).
    pub fn to_msgpack(&self) -> Result<Vec<u8>, WireError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(data: &[u8]) -> Result<Self, WireError> {
        Ok(rmp_serde::from_slice(data)?)
    }
}

/// A reply from the backend, tagged on the wire by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reply {
    Ready,
    Output {
        video_bytes: ByteBuf,
    },
    /// Any reply type this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Payload-free discriminant of a [`Reply`], cheap to clone into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Ready,
    Output,
    Unknown,
}

impl Reply {
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Ready => ReplyKind::Ready,
            Reply::Output { .. } => ReplyKind::Output,
            Reply::Unknown => ReplyKind::Unknown,
        }
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(flatten)]
    pub reply: Reply,
    #[serde(default)]
    pub reply_to: Option<u32>,
}

impl InboundMessage {
    pub fn from_msgpack(data: &[u8]) -> Result<Self, WireError> {
        Ok(rmp_serde::from_slice(data)?)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, WireError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Raw video payload if this is an `OUTPUT` reply.
    pub fn video_bytes(&self) -> Option<&[u8]> {
        match &self.reply {
            Reply::Output { video_bytes } => Some(video_bytes.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Decode a frame into a loosely typed map so tests can inspect field
    /// names exactly as the backend sees them.
    fn as_map(bytes: &[u8]) -> BTreeMap<String, rmpv::Value> {
        rmp_serde::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_generate_is_a_map_with_type_and_id() {
        let bytes = OutboundMessage::new(7, Command::Generate)
            .to_msgpack()
            .unwrap();
        let map = as_map(&bytes);
        assert_eq!(map.len(), 2);
        assert_eq!(map["type"].as_str(), Some("GENERATE"));
        assert_eq!(map["id"].as_u64(), Some(7));
    }

    #[test]
    fn test_set_pipeline_args_field_names() {
        let message = OutboundMessage::new(
            2,
            Command::SetPipelineArgs {
                seed: 1234,
                pipeline_args: PipelineArgs {
                    prompt: "a river".into(),
                    negative_prompt: "blurry".into(),
                    num_frames: 25,
                    frame_rate: 25,
                    num_inference_steps: 30,
                },
            },
        );
        let map = as_map(&message.to_msgpack().unwrap());
        assert_eq!(map["type"].as_str(), Some("SET_PIPELINE_ARGS"));
        assert_eq!(map["seed"].as_u64(), Some(1234));
        let args = &map["pipeline_args"];
        let args: BTreeMap<String, rmpv::Value> = rmpv::ext::from_value(args.clone()).unwrap();
        assert_eq!(args["prompt"].as_str(), Some("a river"));
        assert_eq!(args["negative_prompt"].as_str(), Some("blurry"));
        assert_eq!(args["num_frames"].as_u64(), Some(25));
        assert_eq!(args["frame_rate"].as_u64(), Some(25));
        assert_eq!(args["num_inference_steps"].as_u64(), Some(30));
    }

    #[test]
    fn test_update_conditioning_keeps_null_pop_latents() {
        let bytes = OutboundMessage::new(3, Command::update_conditioning(None, None))
            .to_msgpack()
            .unwrap();
        let map = as_map(&bytes);
        assert!(map["pop_latents"].is_nil());
        assert!(!map.contains_key("video_bytes"));
        assert!(!map.contains_key("masks_bytes"));
    }

    #[test]
    fn test_update_conditioning_payload_is_binary() {
        let payload = ConditioningPayload {
            video_bytes: vec![1, 2, 3],
            masks_bytes: vec![vec![9], vec![8, 7]],
        };
        let message = OutboundMessage::new(4, Command::update_conditioning(Some(2), Some(payload)));
        let map = as_map(&message.to_msgpack().unwrap());
        assert_eq!(map["pop_latents"].as_u64(), Some(2));
        assert_eq!(map["video_bytes"].as_slice(), Some(&[1u8, 2, 3][..]));
        let masks = map["masks_bytes"].as_array().unwrap();
        assert_eq!(masks.len(), 2);
        assert_eq!(masks[1].as_slice(), Some(&[8u8, 7][..]));

        let decoded = OutboundMessage::from_msgpack(&message.to_msgpack().unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_decode_output_reply() {
        let reply = InboundMessage {
            reply: Reply::Output {
                video_bytes: ByteBuf::from(vec![0xde, 0xad]),
            },
            reply_to: Some(5),
        };
        let decoded = InboundMessage::from_msgpack(&reply.to_msgpack().unwrap()).unwrap();
        assert_eq!(decoded.reply_to, Some(5));
        assert_eq!(decoded.reply.kind(), ReplyKind::Output);
        assert_eq!(decoded.video_bytes(), Some(&[0xde, 0xad][..]));
    }

    #[test]
    fn test_decode_unknown_reply_type() {
        let mut map = BTreeMap::new();
        map.insert("type", rmpv::Value::from("PROGRESS"));
        map.insert("reply_to", rmpv::Value::from(9));
        let bytes = rmp_serde::to_vec_named(&map).unwrap();
        let decoded = InboundMessage::from_msgpack(&bytes).unwrap();
        assert_eq!(decoded.reply, Reply::Unknown);
        assert_eq!(decoded.reply_to, Some(9));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(InboundMessage::from_msgpack(&[0xc1, 0x00]).is_err());
    }
}
