//! Playback target capability resolution
//!
//! The background context cannot render audio on every host: where the host
//! supports an auxiliary offscreen context that context plays audio, and the
//! popup UI is the fallback; hosts without one invert the order. Capability
//! is probed once and cached in the resolved [`PlaybackTarget`] rather than
//! re-sniffed at call sites.

use readaloud_protocol::{ContextBus, ContextId};

/// Host capability snapshot, probed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Whether the host can run an offscreen audio context.
    pub offscreen_playback: bool,
}

impl HostCapabilities {
    /// Feature-probe the running host: an offscreen context that registered
    /// an inbox is one the host could create.
    pub fn probe(bus: &ContextBus) -> Self {
        Self {
            offscreen_playback: bus.is_registered(ContextId::Offscreen),
        }
    }
}

/// Where `PLAY_AUDIO` goes first, and where to retry when that fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTarget {
    pub primary: ContextId,
    pub fallback: ContextId,
}

pub fn resolve_playback_target(caps: HostCapabilities) -> PlaybackTarget {
    if caps.offscreen_playback {
        PlaybackTarget {
            primary: ContextId::Offscreen,
            fallback: ContextId::Popup,
        }
    } else {
        PlaybackTarget {
            primary: ContextId::Popup,
            fallback: ContextId::Offscreen,
        }
    }
}
