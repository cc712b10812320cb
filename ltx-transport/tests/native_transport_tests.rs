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

//! Native channel tests. Tests that need a running pipeline server are
//! `#[ignore]`d.

#[cfg(not(target_arch = "wasm32"))]
mod native_channel_tests {
    use ltx_transport::native_websocket::{
        spawn_channel, NativeWebSocket, Outbound, WebSocketConnectError,
    };
    use ltx_transport::ChannelEvent;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let result = NativeWebSocket::connect("not-a-url").await;
        assert!(matches!(
            result,
            Err(WebSocketConnectError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_fails_with_unreachable_server() {
        let result = NativeWebSocket::connect("ws://127.0.0.1:1/ws").await;
        assert!(matches!(result, Err(WebSocketConnectError::Other(_))));
    }

    #[tokio::test]
    async fn test_spawned_channel_reports_error_then_closed() {
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let _outbound = spawn_channel("ws://127.0.0.1:1/ws".to_string(), events_tx);
        assert!(matches!(events.recv().await, Some(ChannelEvent::Error(_))));
        assert_eq!(events.recv().await, Some(ChannelEvent::Closed));
    }

    /// Requires a pipeline server on localhost:8000.
    /// Run with: `cargo test -p ltx-transport -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn test_open_then_close() {
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let outbound = spawn_channel("ws://localhost:8000/ws".to_string(), events_tx);
        assert_eq!(events.recv().await, Some(ChannelEvent::Opened));
        outbound.send(Outbound::Close).unwrap();
        assert_eq!(events.recv().await, Some(ChannelEvent::Closed));
    }
}
