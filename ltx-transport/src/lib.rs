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

//! Binary WebSocket channels for the LTX pipeline client.
//!
//! # Features
//!
//! - **`native`**: `tokio-tungstenite` client for desktop and server targets
//! - **`wasm`**: browser WebSocket via `web-sys`

#[cfg(feature = "wasm")]
pub mod websocket;

#[cfg(feature = "native")]
pub mod native_websocket;

/// Lifecycle and data notifications produced by a channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    /// The connection finished its handshake and can carry frames.
    Opened,
    /// A binary frame arrived.
    Message(Vec<u8>),
    /// The connection failed; a `Closed` normally follows.
    Error(String),
    /// The connection is gone.
    Closed,
}
