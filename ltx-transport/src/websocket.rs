//! Browser WebSocket channel built on `web-sys`.
//!
//! Forked from yew-websocket (MIT licensed, Copyright (c) 2017 Denis Kolodin),
//! reduced to binary frames and reporting through a single [`ChannelEvent`]
//! handler.

use std::fmt;
use std::rc::Rc;

use gloo::events::EventListener;
use js_sys::Uint8Array;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, Event, MessageEvent, WebSocket};

use crate::ChannelEvent;

/// Receives every event of one connection.
pub type EventHandler = Rc<dyn Fn(ChannelEvent)>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WebSocketError {
    #[error("{0}")]
    CreationError(String),
    #[error("failed to send frame: {0}")]
    SendError(String),
}

/// A handle to control the WebSocket connection.
#[must_use = "the connection will be closed when the task is dropped"]
pub struct WebSocketTask {
    ws: WebSocket,
    #[allow(dead_code)]
    listeners: [EventListener; 4],
}

impl fmt::Debug for WebSocketTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebSocketTask")
    }
}

/// Opens browser WebSocket connections.
#[derive(Default, Debug)]
pub struct WebSocketService {}

impl WebSocketService {
    /// Open `url` with an `arraybuffer` binary type. Binary frames are
    /// delivered as [`ChannelEvent::Message`]; text frames are dropped.
    pub fn connect_binary(url: &str, handler: EventHandler) -> Result<WebSocketTask, WebSocketError> {
        let ws = WebSocket::new(url).map_err(|ws_error| {
            WebSocketError::CreationError(
                ws_error
                    .unchecked_into::<js_sys::Error>()
                    .to_string()
                    .as_string()
                    .unwrap_or_else(|| format!("unable to open {url}")),
            )
        })?;
        ws.set_binary_type(BinaryType::Arraybuffer);

        let notify = handler.clone();
        let listener_open = EventListener::new(&ws, "open", move |_: &Event| {
            notify(ChannelEvent::Opened);
        });
        let notify = handler.clone();
        let listener_close = EventListener::new(&ws, "close", move |_: &Event| {
            notify(ChannelEvent::Closed);
        });
        let notify = handler.clone();
        let listener_error = EventListener::new(&ws, "error", move |_: &Event| {
            notify(ChannelEvent::Error("WebSocket error".to_string()));
        });
        let listener_message = EventListener::new(&ws, "message", move |event: &Event| {
            if let Some(event) = event.dyn_ref::<MessageEvent>() {
                if let Some(bytes) = binary_payload(event) {
                    handler(ChannelEvent::Message(bytes));
                } else {
                    log::debug!("WebSocket text frame ignored (protocol uses msgpack)");
                }
            }
        });

        Ok(WebSocketTask {
            ws,
            listeners: [listener_open, listener_close, listener_error, listener_message],
        })
    }
}

fn binary_payload(event: &MessageEvent) -> Option<Vec<u8>> {
    let data = event.data();
    if data.is_string() {
        None
    } else {
        Some(Uint8Array::new(&data).to_vec())
    }
}

impl WebSocketTask {
    /// Sends binary data to a WebSocket connection.
    pub fn send_binary(&self, data: &[u8]) -> Result<(), WebSocketError> {
        self.ws
            .send_with_u8_array(data)
            .map_err(|e| WebSocketError::SendError(format!("{e:?}")))
    }

    /// Start the closing handshake. A `Closed` event follows.
    pub fn close(&self) {
        if self.is_active() {
            self.ws.close().ok();
        }
    }

    fn is_active(&self) -> bool {
        matches!(
            self.ws.ready_state(),
            WebSocket::CONNECTING | WebSocket::OPEN
        )
    }
}

impl Drop for WebSocketTask {
    fn drop(&mut self) {
        self.close();
    }
}
