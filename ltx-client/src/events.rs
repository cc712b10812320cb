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

//! Framework-agnostic event types for the pipeline client.

use ltx_types::ReplyKind;

use crate::settings::{Generation, GenerationSettings};

/// Events published on the [`EventBus`](crate::EventBus).
#[derive(Clone, Debug)]
pub enum ClientEvent {
    // === Connection Events ===
    /// The channel opened and the session can send.
    Connected,

    /// The channel closed; all session state has been reset.
    ConnectionLost(String),

    /// The channel failed. Carries a notice suitable for showing to the user.
    ConnectionError(String),

    // === Protocol Events ===
    /// A reply was decoded.
    Reply {
        reply_to: Option<u32>,
        kind: ReplyKind,
    },

    /// A chunk of generated video arrived.
    Output(Generation),

    // === State Events ===
    /// Generation settings were edited.
    SettingsChanged(GenerationSettings),
}
