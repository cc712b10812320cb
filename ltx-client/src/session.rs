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

//! Connection lifecycle, message ids and reply handling for one pipeline
//! server.
//!
//! [`Session`] does no I/O of its own. It sends through the [`Channel`] its
//! [`Connector`] opened and is driven by feeding every [`ChannelEvent`] of
//! that channel to [`Session::handle_event`]. Two delivery policies share the
//! state machine:
//!
//! - [`DeliveryPolicy::Queued`]: a message goes out at once when the server
//!   has acknowledged everything before it, otherwise it waits in a FIFO
//!   queue that drains one message per reply. A message the channel refuses
//!   stays at the head of the queue.
//! - [`DeliveryPolicy::SingleInFlight`]: one request at a time. A second
//!   send before the reply fails with [`SessionError::Busy`], and every send
//!   returns a continuation resolved by its reply.
//!
//! Closing the channel resets everything: ids, queue, busy flags and the
//! pending continuation.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use futures::channel::oneshot;
use log::{debug, error, info, warn};
use ltx_transport::ChannelEvent;
use ltx_types::{Command, InboundMessage, OutboundMessage, Reply, WireError};
use thiserror::Error;

use crate::connector::{Channel, Connector};
use crate::event_bus::EventBus;
use crate::events::ClientEvent;
use crate::settings::{AppState, Generation};

/// Shown to the user when the channel cannot be established.
pub const CONNECTION_ERROR_NOTICE: &str = "Unable to connect to the server - please ensure you entered the correct Server URL (e.g. http://127.0.0.1:8000/ws)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    Queued,
    SingleInFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub policy: DeliveryPolicy,
    /// Queue `CREATE_PIPELINE` as the first message of every connection.
    /// Only honoured by [`DeliveryPolicy::Queued`].
    pub create_pipeline_on_connect: bool,
}

impl SessionOptions {
    pub fn queued() -> Self {
        Self {
            policy: DeliveryPolicy::Queued,
            create_pipeline_on_connect: true,
        }
    }

    pub fn single_in_flight() -> Self {
        Self {
            policy: DeliveryPolicy::SingleInFlight,
            create_pipeline_on_connect: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a connection already exists")]
    AlreadyConnected,
    #[error("session is busy - did you forget to await a previous reply?")]
    Busy,
    #[error("channel error: {0}")]
    Channel(String),
    #[error("not connected")]
    NotConnected,
    #[error("no reply will arrive: the connection closed or the reply was malformed")]
    Disconnected,
    #[error("message was sent without a reply continuation")]
    NoReply,
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Receipt for a sent (or queued) message.
#[derive(Debug)]
pub struct OutgoingMessage {
    id: u32,
    reply: Option<oneshot::Receiver<InboundMessage>>,
}

impl OutgoingMessage {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Wait for the reply. Only single-in-flight sends carry a continuation;
    /// it fails with [`SessionError::Disconnected`] if the channel closes
    /// first or the reply cannot be decoded.
    pub async fn reply(self) -> Result<InboundMessage, SessionError> {
        match self.reply {
            Some(rx) => rx.await.map_err(|_| SessionError::Disconnected),
            None => Err(SessionError::NoReply),
        }
    }
}

pub struct Session<C: Connector> {
    connector: C,
    options: SessionOptions,
    app_state: Rc<RefCell<AppState>>,
    bus: EventBus,

    channel: Option<C::Channel>,
    state: ConnectionState,
    url: Option<String>,

    most_recent_sent_id: Option<u32>,
    most_recent_received_id: Option<u32>,

    // Queued
    queue: VecDeque<OutboundMessage>,
    ready_to_send: bool,

    // SingleInFlight
    awaiting_reply: bool,
    pending_reply: Option<oneshot::Sender<InboundMessage>>,

    /// Set by the first `OUTPUT` of a connection; later outputs skip frames.
    should_skip_frames: bool,
}

impl<C: Connector> Session<C> {
    pub fn new(
        connector: C,
        options: SessionOptions,
        app_state: Rc<RefCell<AppState>>,
        bus: EventBus,
    ) -> Self {
        Self {
            connector,
            options,
            app_state,
            bus,
            channel: None,
            state: ConnectionState::Disconnected,
            url: None,
            most_recent_sent_id: None,
            most_recent_received_id: None,
            queue: VecDeque::new(),
            ready_to_send: false,
            awaiting_reply: false,
            pending_reply: None,
            should_skip_frames: false,
        }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.options.policy
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Queued: a sent message has not been answered yet.
    /// Single-in-flight: a request is awaiting its reply.
    pub fn busy(&self) -> bool {
        match self.options.policy {
            DeliveryPolicy::Queued => self.most_recent_sent_id != self.most_recent_received_id,
            DeliveryPolicy::SingleInFlight => self.awaiting_reply,
        }
    }

    pub fn most_recent_sent_id(&self) -> Option<u32> {
        self.most_recent_sent_id
    }

    pub fn most_recent_received_id(&self) -> Option<u32> {
        self.most_recent_received_id
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn connected_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn app_state(&self) -> &Rc<RefCell<AppState>> {
        &self.app_state
    }

    /// Open a channel to `url`. The session is `Connecting` until the
    /// channel reports `Opened`.
    pub fn connect(&mut self, url: &str) -> Result<(), SessionError> {
        if self.channel.is_some() {
            return Err(SessionError::AlreadyConnected);
        }
        let channel = self.connector.open(url).map_err(|e| {
            error!("failed to open channel to {url}: {e}");
            self.bus
                .publish(ClientEvent::ConnectionError(CONNECTION_ERROR_NOTICE.to_string()));
            SessionError::Channel(e.to_string())
        })?;

        info!("connecting to {url}");
        self.channel = Some(channel);
        self.state = ConnectionState::Connecting;
        self.url = Some(url.to_string());

        if self.options.policy == DeliveryPolicy::Queued && self.options.create_pipeline_on_connect
        {
            self.send_message(Command::CreatePipeline)?;
        }
        Ok(())
    }

    /// Close the channel and drop queued messages. State is reset once the
    /// channel reports `Closed`.
    pub fn disconnect(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            info!("disconnecting");
            channel.close();
        }
        self.queue.clear();
    }

    /// Stamp `command` with the next id and deliver it per the session's
    /// policy.
    pub fn send_message(&mut self, command: Command) -> Result<OutgoingMessage, SessionError> {
        match self.options.policy {
            DeliveryPolicy::Queued => {
                let id = self.next_id();
                self.most_recent_sent_id = Some(id);
                let message = OutboundMessage::new(id, command);
                debug!("queueing {} #{id}", message.command);
                self.queue.push_back(message);
                if self.ready_to_send && self.channel.is_some() {
                    self.drain_next()?;
                }
                Ok(OutgoingMessage { id, reply: None })
            }
            DeliveryPolicy::SingleInFlight => {
                if self.awaiting_reply {
                    return Err(SessionError::Busy);
                }
                if self.state != ConnectionState::Connected {
                    return Err(SessionError::NotConnected);
                }
                let id = self.next_id();
                let message = OutboundMessage::new(id, command);
                self.transmit(&message)?;
                self.most_recent_sent_id = Some(id);
                self.awaiting_reply = true;
                let (tx, rx) = oneshot::channel();
                self.pending_reply = Some(tx);
                Ok(OutgoingMessage {
                    id,
                    reply: Some(rx),
                })
            }
        }
    }

    /// Feed one event from the channel opened by [`Session::connect`].
    pub fn handle_event(&mut self, event: ChannelEvent) -> Result<(), SessionError> {
        match event {
            ChannelEvent::Opened => {
                self.handle_open();
                Ok(())
            }
            ChannelEvent::Message(data) => self.handle_message(&data),
            ChannelEvent::Error(reason) => {
                warn!("channel error: {reason}");
                self.bus
                    .publish(ClientEvent::ConnectionError(CONNECTION_ERROR_NOTICE.to_string()));
                Ok(())
            }
            ChannelEvent::Closed => {
                self.handle_close();
                Ok(())
            }
        }
    }

    fn handle_open(&mut self) {
        if self.channel.is_none() {
            warn!("open event without a channel, ignoring");
            return;
        }
        info!(
            "connected to {}",
            self.url.as_deref().unwrap_or("<unknown>")
        );
        self.state = ConnectionState::Connected;
        self.bus.publish(ClientEvent::Connected);
        if self.options.policy == DeliveryPolicy::Queued {
            if let Err(e) = self.drain_next() {
                error!("failed to send queued message: {e}");
            }
        }
    }

    fn handle_message(&mut self, data: &[u8]) -> Result<(), SessionError> {
        if self.channel.is_none() {
            debug!("dropping {} bytes received without a channel", data.len());
            return Ok(());
        }

        let drained = match self.options.policy {
            DeliveryPolicy::Queued => {
                self.ready_to_send = false;
                self.drain_next()
            }
            DeliveryPolicy::SingleInFlight => Ok(()),
        };

        let message = match InboundMessage::from_msgpack(data) {
            Ok(message) => message,
            Err(e) => {
                error!("failed to decode reply: {e}");
                if self.options.policy == DeliveryPolicy::SingleInFlight {
                    self.awaiting_reply = false;
                    self.pending_reply = None;
                }
                return Err(e.into());
            }
        };
        debug!(
            "received {:?} reply to {:?}",
            message.reply.kind(),
            message.reply_to
        );

        match self.options.policy {
            DeliveryPolicy::Queued => {
                self.most_recent_received_id = message.reply_to;
            }
            DeliveryPolicy::SingleInFlight => {
                let matches =
                    message.reply_to.is_none() || message.reply_to == self.most_recent_sent_id;
                if !matches {
                    warn!(
                        "ignoring reply to {:?} while awaiting {:?}",
                        message.reply_to, self.most_recent_sent_id
                    );
                    return drained;
                }
                self.most_recent_received_id = self.most_recent_sent_id;
                self.awaiting_reply = false;
            }
        }

        self.bus.publish(ClientEvent::Reply {
            reply_to: message.reply_to,
            kind: message.reply.kind(),
        });

        if let Reply::Output { video_bytes } = &message.reply {
            self.handle_output(video_bytes);
        }

        if let Some(pending) = self.pending_reply.take() {
            if pending.send(message).is_err() {
                debug!("reply continuation was dropped by the caller");
            }
        }
        drained
    }

    fn handle_output(&mut self, video_bytes: &[u8]) {
        let (frame_rate, frames_to_skip) = {
            let state = self.app_state.borrow();
            let settings = state.settings();
            let skip = if self.should_skip_frames {
                settings.frames_to_skip()
            } else {
                self.should_skip_frames = true;
                0
            };
            (settings.frame_rate, skip)
        };
        let generation = Generation {
            video_bytes: Arc::from(video_bytes),
            frame_rate,
            frames_to_skip,
        };
        info!(
            "output: {} bytes, skipping {frames_to_skip} frames",
            video_bytes.len()
        );
        self.app_state
            .borrow_mut()
            .record_generation(generation.clone());
        self.bus.publish(ClientEvent::Output(generation));
    }

    fn handle_close(&mut self) {
        let was_open = self.channel.is_some();
        self.channel = None;
        self.state = ConnectionState::Disconnected;
        self.url = None;
        self.queue.clear();
        self.ready_to_send = false;
        self.most_recent_sent_id = None;
        self.most_recent_received_id = None;
        self.should_skip_frames = false;
        self.awaiting_reply = false;
        // Dropping the sender fails the caller's continuation.
        self.pending_reply = None;
        if was_open {
            info!("connection closed");
            self.bus
                .publish(ClientEvent::ConnectionLost("connection closed".to_string()));
        }
    }

    /// Send the next queued message, or mark the channel ready when the
    /// queue is empty.
    ///
    /// A message the channel refused goes back to the front of the queue and
    /// the channel stays ready, so the next send or reply retries it.
    fn drain_next(&mut self) -> Result<(), SessionError> {
        let Some(message) = self.queue.pop_front() else {
            self.ready_to_send = true;
            return Ok(());
        };
        self.ready_to_send = false;
        match self.transmit(&message) {
            Err(e @ SessionError::Channel(_)) => {
                warn!("send of {} #{} failed, requeueing", message.command, message.id);
                self.queue.push_front(message);
                self.ready_to_send = true;
                Err(e)
            }
            result => result,
        }
    }

    fn transmit(&mut self, message: &OutboundMessage) -> Result<(), SessionError> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;
        let bytes = message.to_msgpack()?;
        debug!("sending {} #{} ({} bytes)", message.command, message.id, bytes.len());
        channel
            .send(bytes)
            .map_err(|e| SessionError::Channel(e.to_string()))
    }

    fn next_id(&self) -> u32 {
        self.most_recent_sent_id.unwrap_or(0) + 1
    }
}

impl<C: Connector> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("policy", &self.options.policy)
            .field("state", &self.state)
            .field("most_recent_sent_id", &self.most_recent_sent_id)
            .field("most_recent_received_id", &self.most_recent_received_id)
            .field("queued", &self.queue.len())
            .finish()
    }
}
