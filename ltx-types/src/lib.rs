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

//! Wire types for the LTX pipeline client.
//!
//! Every frame exchanged with the backend is a msgpack map. Outbound frames are
//! [`OutboundMessage`]s (a [`Command`] plus a monotonically increasing `id`),
//! inbound frames are [`InboundMessage`]s (a [`Reply`] plus the `reply_to` id).

pub mod messages;

pub use messages::{
    Command, ConditioningPayload, InboundMessage, OutboundMessage, PipelineArgs, Reply,
    ReplyKind, WireError,
};
