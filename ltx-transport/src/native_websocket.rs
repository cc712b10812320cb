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

//! Native binary WebSocket channel on `tokio-tungstenite`.
//!
//! One tokio task owns each socket. The caller talks to it through an
//! [`Outbound`] sender and hears back through [`ChannelEvent`]s:
//!
//! ```no_run
//! use ltx_transport::native_websocket::{spawn_channel, Outbound};
//! use ltx_transport::ChannelEvent;
//! use tokio::sync::mpsc;
//!
//! # async fn example() {
//! let (events_tx, mut events) = mpsc::unbounded_channel();
//! let outbound = spawn_channel("ws://localhost:8000/ws".to_string(), events_tx);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ChannelEvent::Opened => {
//!             let _ = outbound.send(Outbound::Frame(vec![0x80]));
//!         }
//!         ChannelEvent::Message(data) => println!("{} bytes", data.len()),
//!         ChannelEvent::Error(e) => eprintln!("{e}"),
//!         ChannelEvent::Closed => break,
//!     }
//! }
//! # }
//! ```

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::ChannelEvent;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum WebSocketConnectError {
    /// The URL did not parse or does not use the `ws`/`wss` scheme.
    #[error("invalid WebSocket URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The server answered the upgrade request with an HTTP error.
    #[error("upgrade rejected with HTTP {status}")]
    HttpError { status: u16 },
    #[error("{0}")]
    Other(String),
}

impl WebSocketConnectError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status } => Some(*status),
            _ => None,
        }
    }
}

/// Check that `url` is an absolute `ws://` or `wss://` URL.
pub fn validate_url(url: &str) -> Result<url::Url, WebSocketConnectError> {
    let parsed = url::Url::parse(url).map_err(|e| WebSocketConnectError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(WebSocketConnectError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Requests to a connection task.
pub enum Outbound {
    Frame(Vec<u8>),
    /// Send a close frame; the task ends once the peer answers.
    Close,
}

impl std::fmt::Debug for Outbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outbound::Frame(data) => write!(f, "Frame({} bytes)", data.len()),
            Outbound::Close => f.write_str("Close"),
        }
    }
}

/// An open socket, not yet driven.
pub struct NativeWebSocket {
    stream: WsStream,
}

impl std::fmt::Debug for NativeWebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NativeWebSocket")
    }
}

impl NativeWebSocket {
    /// Perform the handshake with `url`.
    pub async fn connect(url: &str) -> Result<Self, WebSocketConnectError> {
        let url = validate_url(url)?;
        debug!("opening {url}");
        let (stream, response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| match e {
                tungstenite::Error::Http(resp) => WebSocketConnectError::HttpError {
                    status: resp.status().as_u16(),
                },
                other => WebSocketConnectError::Other(format!("connecting to {url}: {other}")),
            })?;
        info!("opened {url} (HTTP {})", response.status());
        Ok(Self { stream })
    }

    /// Pump frames both ways until either side closes. Binary frames are
    /// reported as [`ChannelEvent::Message`]; text frames are dropped.
    pub async fn run(
        self,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) {
        let (mut sink, mut source) = self.stream.split();
        let mut closing = false;
        loop {
            tokio::select! {
                frame = source.next() => match frame {
                    Some(Ok(Message::Binary(data))) => {
                        if events.send(ChannelEvent::Message(data)).is_err() {
                            debug!("event receiver dropped, leaving");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!("peer closed: {frame:?}");
                        break;
                    }
                    Some(Ok(Message::Text(_))) => debug!("text frame ignored"),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        if !closing {
                            warn!("read failed: {e}");
                            let _ = events.send(ChannelEvent::Error(e.to_string()));
                        }
                        break;
                    }
                    None => break,
                },
                request = outbound.recv(), if !closing => match request {
                    Some(Outbound::Frame(data)) => {
                        if let Err(e) = sink.send(Message::Binary(data)).await {
                            warn!("write failed: {e}");
                            let _ = events.send(ChannelEvent::Error(e.to_string()));
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        closing = true;
                        if let Err(e) = sink.send(Message::Close(None)).await {
                            debug!("close frame not sent: {e}");
                            break;
                        }
                    }
                },
            }
        }
    }
}

/// Connect to `url` on a new task. Reports `Opened` (or `Error`) and always
/// ends with `Closed`.
pub fn spawn_channel(
    url: String,
    events: mpsc::UnboundedSender<ChannelEvent>,
) -> mpsc::UnboundedSender<Outbound> {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        match NativeWebSocket::connect(&url).await {
            Ok(socket) => {
                let _ = events.send(ChannelEvent::Opened);
                socket.run(outbound_rx, events.clone()).await;
                info!("closed {url}");
            }
            Err(e) => {
                warn!("cannot connect to {url}: {e}");
                let _ = events.send(ChannelEvent::Error(e.to_string()));
            }
        }
        let _ = events.send(ChannelEvent::Closed);
    });
    outbound_tx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_only_for_http_errors() {
        assert_eq!(
            WebSocketConnectError::HttpError { status: 403 }.http_status(),
            Some(403)
        );
        assert_eq!(WebSocketConnectError::Other("reset".into()).http_status(), None);
    }

    #[test]
    fn test_validate_url_accepts_ws_and_wss() {
        assert!(validate_url("ws://localhost:8000/ws").is_ok());
        assert!(validate_url("wss://example.com/ws").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_http_scheme() {
        let err = validate_url("http://127.0.0.1:8000/ws").unwrap_err();
        assert!(matches!(err, WebSocketConnectError::InvalidUrl { .. }));
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_validate_url_rejects_relative() {
        assert!(validate_url("/ws").is_err());
    }

    #[test]
    fn test_outbound_debug_hides_payload() {
        assert_eq!(format!("{:?}", Outbound::Frame(vec![0; 3])), "Frame(3 bytes)");
    }
}
