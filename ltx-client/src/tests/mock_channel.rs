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

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use ltx_types::{Command, InboundMessage, OutboundMessage, Reply};
use serde_bytes::ByteBuf;

use crate::connector::{Channel, Connector};

/// What the mock server has seen, shared between the test and the session.
#[derive(Debug, Default)]
pub struct MockWire {
    pub opened_urls: Vec<String>,
    pub sent: Vec<Vec<u8>>,
    pub close_requests: usize,
    pub fail_open: bool,
    pub fail_send: bool,
}

impl MockWire {
    /// Decode every frame sent so far.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent
            .iter()
            .map(|bytes| OutboundMessage::from_msgpack(bytes).unwrap())
            .collect()
    }

    pub fn sent_ids(&self) -> Vec<u32> {
        self.sent_messages().iter().map(|m| m.id).collect()
    }

    pub fn sent_commands(&self) -> Vec<Command> {
        self.sent_messages().into_iter().map(|m| m.command).collect()
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    pub wire: Rc<RefCell<MockWire>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for MockConnector {
    type Channel = MockChannel;

    fn open(&mut self, url: &str) -> anyhow::Result<MockChannel> {
        let mut wire = self.wire.borrow_mut();
        if wire.fail_open {
            return Err(anyhow!("connection refused"));
        }
        wire.opened_urls.push(url.to_string());
        Ok(MockChannel {
            wire: self.wire.clone(),
        })
    }
}

pub struct MockChannel {
    wire: Rc<RefCell<MockWire>>,
}

impl Channel for MockChannel {
    fn send(&mut self, data: Vec<u8>) -> anyhow::Result<()> {
        let mut wire = self.wire.borrow_mut();
        if wire.fail_send {
            return Err(anyhow!("broken pipe"));
        }
        wire.sent.push(data);
        Ok(())
    }

    fn close(&mut self) {
        self.wire.borrow_mut().close_requests += 1;
    }
}

pub fn ready_reply(reply_to: u32) -> Vec<u8> {
    InboundMessage {
        reply: Reply::Ready,
        reply_to: Some(reply_to),
    }
    .to_msgpack()
    .unwrap()
}

pub fn output_reply(reply_to: u32, video_bytes: &[u8]) -> Vec<u8> {
    InboundMessage {
        reply: Reply::Output {
            video_bytes: ByteBuf::from(video_bytes.to_vec()),
        },
        reply_to: Some(reply_to),
    }
    .to_msgpack()
    .unwrap()
}
