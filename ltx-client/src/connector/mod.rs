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

//! The seam between [`Session`](crate::Session) and a concrete transport.
//!
//! A connector opens channels; the channel's lifecycle and inbound frames
//! come back to the session as [`ChannelEvent`](ltx_transport::ChannelEvent)s
//! through whatever event loop the application runs.

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "wasm")]
pub mod wasm;

/// The sending half of an open channel, exclusively owned by the session.
pub trait Channel {
    fn send(&mut self, data: Vec<u8>) -> anyhow::Result<()>;

    /// Begin closing. A `Closed` event must follow.
    fn close(&mut self);
}

/// Opens channels to the pipeline server.
pub trait Connector {
    type Channel: Channel;

    /// Start connecting to `url`. `Opened` (or `Error` and `Closed`) is
    /// reported later through the event stream.
    fn open(&mut self, url: &str) -> anyhow::Result<Self::Channel>;
}
