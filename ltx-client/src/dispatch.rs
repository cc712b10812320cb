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

use std::collections::VecDeque;

use log::debug;
use ltx_types::Command;

use crate::connector::Connector;
use crate::session::{DeliveryPolicy, Session, SessionError};

/// Holds commands until the session can take them.
///
/// A queued session accepts everything at once and orders delivery itself.
/// A single-in-flight session takes one command per reply, so call
/// [`Dispatcher::pump`] again after every reply.
#[derive(Debug, Default)]
pub struct Dispatcher {
    pending: VecDeque<Command>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything, e.g. after the connection was lost.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Hand as many commands to `session` as its policy allows. Returns how
    /// many were handed over.
    pub fn pump<C: Connector>(&mut self, session: &mut Session<C>) -> Result<usize, SessionError> {
        let mut sent = 0;
        match session.policy() {
            DeliveryPolicy::Queued => {
                while let Some(command) = self.pending.pop_front() {
                    session.send_message(command)?;
                    sent += 1;
                }
            }
            DeliveryPolicy::SingleInFlight => {
                if session.connected() && !session.busy() {
                    if let Some(command) = self.pending.pop_front() {
                        session.send_message(command)?;
                        sent += 1;
                    }
                }
            }
        }
        if sent > 0 {
            debug!("dispatched {sent} commands, {} pending", self.pending.len());
        }
        Ok(sent)
    }
}
