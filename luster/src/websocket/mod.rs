//! The real-time event socket.

pub mod event_handler;
pub(crate) mod transport;
pub mod websocket;

pub use event_handler::{
    ChannelUserEvent, EventHandler, MessageDeleteEvent, MessageUpdateEvent, PartialUpdateEvent,
    ReactionEvent, ReadyEvent,
};
pub use websocket::ConnectionState;
