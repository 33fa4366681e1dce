//! Wire types exchanged between execution contexts

use serde::{Deserialize, Serialize};

/// Snapshot of the coordinator's logical playback state.
///
/// Derived, never stored: the coordinator recomputes it from its flags on
/// every change and broadcasts it. Consumers keep a copy only until the next
/// broadcast arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub is_playing: bool,
    pub is_paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_text: Option<String>,
}

impl PlaybackStatus {
    pub fn idle() -> Self {
        Self {
            is_playing: false,
            is_paused: false,
            current_text: None,
        }
    }
}

/// The closed set of messages routed between contexts.
///
/// One variant per wire `type`; payload shape is fixed per variant so router
/// dispatch is checked for exhaustiveness at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// coordinator -> content: ask the page for its current selection.
    GetSelectedText,
    /// UI/menu -> coordinator: speak the given text, or the page selection
    /// when no text is supplied.
    ReadAloud {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// UI -> coordinator: guarded pause of the current utterance.
    PausePlayback,
    /// UI -> coordinator: guarded resume of a paused utterance.
    ResumePlayback,
    /// UI -> coordinator: unconditional stop.
    StopPlayback,
    /// Query (UI -> coordinator, no payload) or broadcast
    /// (coordinator -> all, payload present).
    PlaybackStatus {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<PlaybackStatus>,
    },
    /// coordinator -> playback target: start a new audio session.
    #[serde(rename_all = "camelCase")]
    PlayAudio { audio_data: String, volume: f32 },
    /// coordinator -> playback target: control messages for the live session.
    PauseAudio,
    ResumeAudio,
    StopAudio,
    /// coordinator <-> playback target: volume update, [0, 1].
    SetVolume { volume: f32 },
    /// playback target -> coordinator: the session finished naturally.
    AudioEnded,
    /// playback target -> coordinator: the session died with an error.
    AudioError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Reply payloads. Every request handler sends exactly one of these;
/// notifications (`AudioEnded`, `AudioError`, status broadcasts) carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Selection {
        text: String,
    },
    Status(PlaybackStatus),
    Ack {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Ack {
            success: true,
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Reply::Ack {
            success: false,
            error: Some(error.into()),
        }
    }
}
