//! Message protocol and context bus for the read-aloud coordination core
//!
//! The extension runs across several isolated execution contexts (background,
//! content, offscreen, popup) that share no memory. This crate defines the
//! closed set of messages they exchange and the bus that routes them:
//! request/reply sends keep a reply channel open until the receiver answers
//! exactly once, while notifications are best-effort and never error.

pub mod bus;
pub mod message;

pub use bus::{BusError, ContextBus, ContextId, Envelope};
pub use message::{Message, PlaybackStatus, Reply};
