//! Audio playback engine
//!
//! Owns at most one decoded audio session at a time: `play` tears down any
//! previous session before starting the next, and every exit path (natural
//! end, explicit stop, superseding play, error) releases the session
//! resource. Device output goes through the [`AudioSink`] trait so the state
//! machine can be exercised without audio hardware.

pub mod engine;
pub mod error;
pub mod sink;

pub use engine::{EngineState, PlaybackEngine, SessionEvent, SessionEventKind};
pub use error::{PlaybackError, PlaybackResult};
pub use sink::{AudioSink, RodioSink};
