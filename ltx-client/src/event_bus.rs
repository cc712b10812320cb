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

//! Broadcast channel for client events.
//!
//! Any number of subscribers each receive every event published after they
//! subscribed. When a subscriber falls behind by more than the capacity, the
//! oldest events are dropped for it.
//!
//! # Example
//!
//! ```ignore
//! use ltx_client::{ClientEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//! bus.publish(ClientEvent::Connected);
//! assert!(matches!(rx.try_recv(), Ok(ClientEvent::Connected)));
//! ```

use async_broadcast::{broadcast, InactiveReceiver, Receiver, Sender};
use std::fmt;

use crate::events::ClientEvent;

/// Capacity of the event bus channel
pub const EVENT_BUS_CAPACITY: usize = 256;

/// A cloneable handle to one broadcast channel of [`ClientEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<ClientEvent>,
    // Keeps the channel open while nobody is subscribed.
    _keep_open: InactiveReceiver<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (mut sender, receiver) = broadcast(capacity);
        sender.set_overflow(true);
        sender.set_await_active(false);
        Self {
            sender,
            _keep_open: receiver.deactivate(),
        }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        self.sender.new_receiver()
    }

    /// Publish without blocking. Events published while nobody is
    /// subscribed are dropped.
    pub fn publish(&self, event: ClientEvent) {
        let _ = self.sender.try_broadcast(event);
    }

    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.sender.capacity())
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}
