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

//! Browser connector backed by [`WebSocketService`].

use anyhow::anyhow;
use ltx_transport::websocket::{EventHandler, WebSocketService, WebSocketTask};

use super::{Channel, Connector};

/// Opens browser WebSockets and routes their events to `handler`.
///
/// The handler usually feeds [`Session::handle_event`](crate::Session::handle_event).
/// Since the session owns this connector, a handler capturing the session
/// must hold it through a `Weak` to avoid an `Rc` cycle.
pub struct WasmConnector {
    handler: EventHandler,
}

impl WasmConnector {
    pub fn new(handler: EventHandler) -> Self {
        Self { handler }
    }
}

impl Connector for WasmConnector {
    type Channel = WebSocketTask;

    fn open(&mut self, url: &str) -> anyhow::Result<WebSocketTask> {
        WebSocketService::connect_binary(url, self.handler.clone()).map_err(|e| anyhow!("{e}"))
    }
}

impl Channel for WebSocketTask {
    fn send(&mut self, data: Vec<u8>) -> anyhow::Result<()> {
        self.send_binary(&data).map_err(|e| anyhow!("{e}"))
    }

    fn close(&mut self) {
        WebSocketTask::close(self);
    }
}
