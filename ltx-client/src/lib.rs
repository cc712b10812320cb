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

//! Client side of the LTX video generation pipeline.
//!
//! The crate holds the user-editable generation settings, talks to the
//! pipeline backend over a binary WebSocket, and builds the conditioning
//! inputs that let each new chunk of video continue from the previous one.
//!
//! It makes no assumptions about the UI. Every long-lived object is
//! constructed by the application and passed where it is needed; UI layers
//! observe changes by subscribing to the [`EventBus`].
//!
//! # Outline of usage
//!
//! ```ignore
//! let bus = EventBus::new();
//! let app_state = Rc::new(RefCell::new(AppState::new(settings, bus.clone())));
//! let (connector, mut channel_events) = NativeConnector::new();
//! let mut session = Session::new(connector, SessionOptions::queued(), app_state.clone(), bus.clone());
//!
//! session.connect(&app_state.borrow().settings().websocket_url)?;
//! while let Some(event) = channel_events.recv().await {
//!     session.handle_event(event);
//! }
//! ```
//!
//! The pieces, leaves first:
//!
//! - [`FrameStore`]: append-only decoded frames plus a pending buffer.
//! - [`PlaceholderCache`]: black/gray/white frames and their encoded bytes.
//! - [`ConditioningAssembler`]: tail frames + padding + per-latent masks.
//! - [`Session`]: message ids, FIFO queue or single request in flight,
//!   reply decoding, reset on close.
//! - [`Orchestrator`] and [`Dispatcher`]: the generate-again loop.

pub mod conditioning;
pub mod connector;
pub mod dispatch;
pub mod event_bus;
pub mod events;
pub mod frame_store;
pub mod orchestrator;
pub mod placeholder;
pub mod session;
pub mod settings;

#[cfg(test)]
mod tests;

pub use conditioning::{
    ConditioningAssembler, ConditioningError, ConditioningItems, FRAMES_PER_LATENT,
};
pub use connector::{Channel, Connector};
pub use dispatch::Dispatcher;
pub use event_bus::EventBus;
pub use events::ClientEvent;
pub use frame_store::FrameStore;
pub use orchestrator::Orchestrator;
pub use placeholder::{Placeholder, PlaceholderCache, Placeholders};
pub use session::{
    ConnectionState, DeliveryPolicy, OutgoingMessage, Session, SessionError, SessionOptions,
};
pub use settings::{AppState, Generation, GenerationSettings};

#[cfg(feature = "native")]
pub use connector::native::{NativeChannel, NativeConnector};
#[cfg(feature = "wasm")]
pub use connector::wasm::WasmConnector;
