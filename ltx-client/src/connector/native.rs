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

//! Tokio connector: one [`spawn_channel`] task per connection.

use anyhow::anyhow;
use log::debug;
use ltx_transport::native_websocket::{spawn_channel, validate_url, Outbound};
use ltx_transport::ChannelEvent;
use tokio::sync::mpsc;

use super::{Channel, Connector};

/// Reports the events of every channel it opens on the receiver returned
/// by [`NativeConnector::new`].
#[derive(Debug, Clone)]
pub struct NativeConnector {
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl NativeConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        (Self { events }, events_rx)
    }
}

impl Connector for NativeConnector {
    type Channel = NativeChannel;

    fn open(&mut self, url: &str) -> anyhow::Result<NativeChannel> {
        let url = validate_url(url)?;
        let out = spawn_channel(url.to_string(), self.events.clone());
        Ok(NativeChannel { out })
    }
}

#[derive(Debug)]
pub struct NativeChannel {
    out: mpsc::UnboundedSender<Outbound>,
}

impl Channel for NativeChannel {
    fn send(&mut self, data: Vec<u8>) -> anyhow::Result<()> {
        self.out
            .send(Outbound::Frame(data))
            .map_err(|_| anyhow!("connection task has exited"))
    }

    fn close(&mut self) {
        if self.out.send(Outbound::Close).is_err() {
            debug!("close requested after the connection task exited");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_rejects_http_url() {
        let (mut connector, _events) = NativeConnector::new();
        assert!(connector.open("http://127.0.0.1:8000/ws").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_error_then_closed() {
        let (mut connector, mut events) = NativeConnector::new();
        let _channel = connector.open("ws://127.0.0.1:1/ws").unwrap();
        assert!(matches!(events.recv().await, Some(ChannelEvent::Error(_))));
        assert_eq!(events.recv().await, Some(ChannelEvent::Closed));
    }

    #[tokio::test]
    async fn test_close_after_task_exit_is_quiet() {
        let (mut connector, mut events) = NativeConnector::new();
        let mut channel = connector.open("ws://127.0.0.1:1/ws").unwrap();
        while let Some(event) = events.recv().await {
            if event == ChannelEvent::Closed {
                break;
            }
        }
        channel.out.closed().await;
        channel.close();
        assert!(channel.send(vec![1, 2, 3]).is_err());
    }
}
